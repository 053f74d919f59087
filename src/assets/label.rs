//! Text labels rasterized into textures
//!
//! A label is one line of text drawn in the middle of a solid canvas, the way the
//! park's welcome sign is painted. Glyphs come from a TrueType/OpenType font through
//! `fontdue`; coverage is blended over the background in the foreground color.

use std::path::Path;

use fontdue::{Font, FontSettings, Metrics};

use crate::gfx::resources::texture_resource::TextureData;

use super::AssetError;

/// Fraction of the canvas width a label may fill before it is shrunk to fit
const MAX_FILL: f32 = 0.95;

/// One line of text centered on a solid canvas
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub text: String,
    pub width: u32,
    pub height: u32,
    /// Glyph size in pixels
    pub font_px: f32,
    /// RGBA8 (sRGB)
    pub background: [u8; 4],
    pub foreground: [u8; 4],
}

impl LabelRequest {
    /// Black text on white
    pub fn new(text: impl Into<String>, width: u32, height: u32, font_px: f32) -> Self {
        Self {
            text: text.into(),
            width,
            height,
            font_px,
            background: [255, 255, 255, 255],
            foreground: [0, 0, 0, 255],
        }
    }

    pub fn with_colors(mut self, background: [u8; 4], foreground: [u8; 4]) -> Self {
        self.background = background;
        self.foreground = foreground;
        self
    }
}

pub fn parse_font(path: &Path, bytes: &[u8]) -> Result<Font, AssetError> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|message| AssetError::Font {
        path: path.to_path_buf(),
        message,
    })
}

struct PlacedGlyph {
    pen_x: f32,
    metrics: Metrics,
    coverage: Vec<u8>,
}

/// Rasterizes `text` on one line; returns the glyphs and the advance of the line
fn layout_line(font: &Font, text: &str, px: f32) -> (Vec<PlacedGlyph>, f32) {
    let mut glyphs = Vec::with_capacity(text.len());
    let mut pen_x = 0.0;
    let mut previous = None;

    for ch in text.chars() {
        if let Some(kern) = previous.and_then(|left| font.horizontal_kern(left, ch, px)) {
            pen_x += kern;
        }
        let (metrics, coverage) = font.rasterize(ch, px);
        glyphs.push(PlacedGlyph {
            pen_x,
            metrics,
            coverage,
        });
        pen_x += metrics.advance_width;
        previous = Some(ch);
    }
    (glyphs, pen_x)
}

/// Draws the label text centered on both axes.
///
/// Text wider than the canvas is drawn at a smaller size so the whole line fits.
pub fn render_label(font: &Font, request: &LabelRequest) -> Result<TextureData, AssetError> {
    let (width, height) = (request.width, request.height);
    if width == 0 || height == 0 {
        return Err(AssetError::EmptyLabel { width, height });
    }

    let mut px = request.font_px;
    let (mut glyphs, mut line_width) = layout_line(font, &request.text, px);
    let max_width = width as f32 * MAX_FILL;
    if line_width > max_width {
        px *= max_width / line_width;
        (glyphs, line_width) = layout_line(font, &request.text, px);
    }

    let (ascent, descent) = font
        .horizontal_line_metrics(px)
        .map_or((px * 0.8, -px * 0.2), |line| (line.ascent, line.descent));
    let origin_x = (width as f32 - line_width) / 2.0;
    // The middle of the ascent..descent band sits on the middle row
    let baseline = (height as f32 / 2.0 + (ascent + descent) / 2.0).round() as i32;

    let mut rgba = request.background.repeat((width * height) as usize);
    for glyph in &glyphs {
        let metrics = &glyph.metrics;
        let left = (origin_x + glyph.pen_x).round() as i32 + metrics.xmin;
        let top = baseline - metrics.ymin - metrics.height as i32;

        for row in 0..metrics.height {
            let y = top + row as i32;
            if y < 0 || y >= height as i32 {
                continue;
            }
            for column in 0..metrics.width {
                let x = left + column as i32;
                if x < 0 || x >= width as i32 {
                    continue;
                }
                let alpha = u32::from(glyph.coverage[row * metrics.width + column]);
                let pixel = ((y as u32 * width + x as u32) * 4) as usize;
                for (under, over) in rgba[pixel..pixel + 4].iter_mut().zip(request.foreground) {
                    *under = ((u32::from(over) * alpha + u32::from(*under) * (255 - alpha) + 127)
                        / 255) as u8;
                }
            }
        }
    }

    TextureData::new(request.text.clone(), width, height, rgba)
        .ok_or(AssetError::EmptyLabel { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundled_font() -> Font {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources/fonts/DejaVuSans-Bold.ttf");
        let bytes = std::fs::read(&path).unwrap();
        parse_font(&path, &bytes).unwrap()
    }

    fn pixel(texture: &TextureData, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * texture.width + x) * 4) as usize;
        [
            texture.rgba[i],
            texture.rgba[i + 1],
            texture.rgba[i + 2],
            texture.rgba[i + 3],
        ]
    }

    /// Bounding box (min x, min y, max x, max y) of pixels darker than mid gray
    fn ink_bounds(texture: &TextureData) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..texture.height {
            for x in 0..texture.width {
                if pixel(texture, x, y)[0] < 128 {
                    let (x0, y0, x1, y1) = bounds.unwrap_or((x, y, x, y));
                    bounds = Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y)));
                }
            }
        }
        bounds
    }

    #[test]
    fn test_welcome_text_is_centered_on_the_canvas() {
        let request = LabelRequest::new("Welcome to Pastel Park!", 512, 256, 40.0);
        let texture = render_label(&bundled_font(), &request).unwrap();

        assert_eq!((texture.width, texture.height), (512, 256));
        assert_eq!(pixel(&texture, 0, 0), [255, 255, 255, 255]);
        assert_eq!(pixel(&texture, 511, 255), [255, 255, 255, 255]);

        let (x0, y0, x1, y1) = ink_bounds(&texture).unwrap();
        // whole line fits with a margin on both sides
        assert!(x0 > 0 && x1 < 511);
        let center_x = (x0 + x1) as f32 / 2.0;
        let center_y = (y0 + y1) as f32 / 2.0;
        assert!((center_x - 256.0).abs() < 8.0, "center x {center_x}");
        assert!((center_y - 128.0).abs() < 12.0, "center y {center_y}");
        // a 40px line is taller than a few rows
        assert!(y1 - y0 > 20);
    }

    #[test]
    fn test_colors_are_applied() {
        let request = LabelRequest::new("A", 64, 64, 48.0)
            .with_colors([66, 135, 245, 255], [0, 0, 0, 255]);
        let texture = render_label(&bundled_font(), &request).unwrap();

        assert_eq!(pixel(&texture, 0, 0), [66, 135, 245, 255]);
        let darkest = texture
            .rgba
            .chunks_exact(4)
            .map(|texel| texel[2])
            .min()
            .unwrap();
        assert_eq!(darkest, 0);
    }

    #[test]
    fn test_long_text_is_shrunk_to_fit() {
        let request = LabelRequest::new("Welcome to Pastel Park!", 128, 64, 40.0);
        let texture = render_label(&bundled_font(), &request).unwrap();

        let (x0, _, x1, _) = ink_bounds(&texture).unwrap();
        assert!(x0 > 0 && x1 < 127);
    }

    #[test]
    fn test_empty_canvas_is_rejected() {
        let request = LabelRequest::new("Hi", 0, 32, 20.0);
        assert!(matches!(
            render_label(&bundled_font(), &request),
            Err(AssetError::EmptyLabel { width: 0, height: 32 })
        ));
    }

    #[test]
    fn test_invalid_font_bytes_are_rejected() {
        let result = parse_font(Path::new("fonts/broken.ttf"), b"definitely not a font");
        assert!(matches!(result, Err(AssetError::Font { .. })));
    }
}

//! Material system for the park's lit and unlit surfaces
//!
//! Materials are plain values owned by mesh and sprite nodes. The render engine
//! turns them into per-object uniforms every frame, so changing a field (for example a
//! stone's emissive highlight) takes effect on the next draw.

use std::sync::Arc;

use super::texture_resource::TextureData;

/// Converts one sRGB channel in `0..=1` to linear space
pub fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear RGB from a `0xRRGGBB` sRGB hex color
pub fn srgb_hex(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xFF) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

/// Lighting model used to shade a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shading {
    #[default]
    Lit,
    /// Outputs base color plus emissive, ignores lights and shadows
    Unlit,
}

/// Which triangle faces are rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// rgb emissive color premultiplied by intensity, w unused
    pub emissive: [f32; 4],
    /// metallic, roughness, flat shading flag, texture flag
    pub params: [f32; 4],
}

/// Material definition with PBR properties
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Linear RGBA; alpha is the opacity used when `transparent` is set
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Linear RGB
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub flat_shading: bool,
    pub transparent: bool,
    pub shading: Shading,
    pub side: Side,
    pub texture: Option<Arc<TextureData>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            flat_shading: false,
            transparent: false,
            shading: Shading::Lit,
            side: Side::Front,
            texture: None,
        }
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Name for debugging
    /// * `color` - Linear RGB base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, color: [f32; 3], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color: [color[0], color[1], color[2], 1.0],
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Unlit material in a single color
    pub fn unlit(name: &str, color: [f32; 3]) -> Self {
        Self {
            shading: Shading::Unlit,
            ..Self::new(name, color, 0.0, 1.0)
        }
    }

    /// Builder pattern: Set base color from linear RGB values
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.set_color([r, g, b]);
        self
    }

    /// Builder pattern: Set opacity and mark the material transparent
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.base_color[3] = opacity.clamp(0.0, 1.0);
        self.transparent = true;
        self
    }

    /// Builder pattern: Set emissive color and intensity
    pub fn with_emission(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.emissive = color;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_flat_shading(mut self) -> Self {
        self.flat_shading = true;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_texture(mut self, texture: Arc<TextureData>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn color(&self) -> [f32; 3] {
        [self.base_color[0], self.base_color[1], self.base_color[2]]
    }

    pub fn set_color(&mut self, color: [f32; 3]) {
        self.base_color = [color[0], color[1], color[2], self.base_color[3]];
    }

    /// Sets the emissive color, keeping the intensity
    pub fn set_emissive(&mut self, color: [f32; 3]) {
        self.emissive = color;
    }

    pub fn uniform(&self) -> MaterialUniform {
        let intensity = self.emissive_intensity;
        MaterialUniform {
            base_color: self.base_color,
            emissive: [
                self.emissive[0] * intensity,
                self.emissive[1] * intensity,
                self.emissive[2] * intensity,
                0.0,
            ],
            params: [
                self.metallic,
                self.roughness,
                if self.flat_shading { 1.0 } else { 0.0 },
                if self.texture.is_some() { 1.0 } else { 0.0 },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_hex_endpoints() {
        assert_eq!(srgb_hex(0x000000), [0.0, 0.0, 0.0]);
        for channel in srgb_hex(0xFFFFFF) {
            assert!((channel - 1.0).abs() < 1e-5);
        }

        let [r, g, b] = srgb_hex(0xFF8000);
        assert!((r - 1.0).abs() < 1e-5);
        assert!((g - 0.2158605).abs() < 1e-4);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_opacity_marks_transparent() {
        let glow = Material::unlit("glow", [1.0, 0.9, 0.6])
            .with_opacity(0.15)
            .with_side(Side::Back);

        assert!(glow.transparent);
        assert_eq!(glow.base_color[3], 0.15);
        assert_eq!(glow.shading, Shading::Unlit);
    }

    #[test]
    fn test_uniform_premultiplies_emissive() {
        let orb = Material::new("orb", [1.0, 0.9, 0.6], 0.5, 0.2)
            .with_emission([1.0, 0.5, 0.0], 0.8)
            .with_flat_shading();
        let uniform = orb.uniform();

        assert_eq!(uniform.emissive, [0.8, 0.4, 0.0, 0.0]);
        assert_eq!(uniform.params, [0.5, 0.2, 1.0, 0.0]);
    }
}

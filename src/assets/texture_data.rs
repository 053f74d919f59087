//! Image decoding into upload-ready texture data

use std::path::{Path, PathBuf};

use crate::gfx::resources::texture_resource::{CubeMapData, TextureData};

use super::AssetError;

/// Decodes any supported image into RGBA8
pub fn decode_texture(path: &Path) -> Result<TextureData, AssetError> {
    let image = image::open(path)
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();

    Ok(TextureData {
        label: path.display().to_string(),
        width,
        height,
        rgba: image.into_raw(),
    })
}

/// Decodes six square faces of equal size, ordered +X, -X, +Y, -Y, +Z, -Z
pub fn decode_cube_map(faces: &[PathBuf; 6]) -> Result<CubeMapData, AssetError> {
    let mut face_size = None;
    let mut pixels: [Vec<u8>; 6] = Default::default();

    for (slot, path) in pixels.iter_mut().zip(faces) {
        let face = decode_texture(path)?;
        let expected = *face_size.get_or_insert(face.width);
        if face.width != expected || face.height != expected {
            return Err(AssetError::CubeFaceMismatch {
                path: path.clone(),
                width: face.width,
                height: face.height,
                expected,
            });
        }
        *slot = face.rgba;
    }

    let face_size = face_size.unwrap_or(0);
    CubeMapData::new(face_size, pixels).ok_or_else(|| AssetError::CubeFaceMismatch {
        path: faces[0].clone(),
        width: face_size,
        height: face_size,
        expected: face_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pastel_park_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_decode_png_to_rgba() {
        let dir = temp_dir("decode_png");
        let path = write_png(&dir, "moon.png", 4, 2);

        let texture = decode_texture(&path).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.rgba.len(), 4 * 2 * 4);
        assert_eq!(&texture.rgba[..4], &[200, 100, 50, 255]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let result = decode_texture(Path::new("definitely/not/here.png"));
        assert!(matches!(result, Err(AssetError::Image { .. })));
    }

    #[test]
    fn test_cube_faces_must_match() {
        let dir = temp_dir("cube_faces");
        let mut faces: [PathBuf; 6] =
            std::array::from_fn(|i| write_png(&dir, &format!("face{i}.png"), 2, 2));
        assert_eq!(decode_cube_map(&faces).unwrap().face_size, 2);

        faces[4] = write_png(&dir, "odd.png", 2, 3);
        assert!(matches!(
            decode_cube_map(&faces),
            Err(AssetError::CubeFaceMismatch { width: 2, height: 3, .. })
        ));

        std::fs::remove_dir_all(dir).ok();
    }
}

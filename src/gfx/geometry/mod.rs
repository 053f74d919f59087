//! # Procedural Geometry Generation
//!
//! This module provides functions to generate the primitive shapes the park is
//! built from, so that only the pre-authored props need external model files.
//!
//! ## Supported Primitives
//!
//! - **Box**: axis-aligned box with per-face normals
//! - **Sphere**: UV sphere with configurable resolution
//! - **Cylinder / Cone**: Y-axis aligned, optionally tapered
//! - **Dodecahedron**: twelve pentagonal faces, used for rocks and bushes
//! - **Plane**: single quad facing +Z, used for sprites
//! - **Extrusion**: closed 2D outlines extruded with a rounded bevel
//!
//! ## Usage
//!
//! ```rust
//! use pastel_park::gfx::geometry::{generate_box, generate_sphere};
//!
//! let stone = generate_box(1.2, 0.1, 0.7).unwrap();
//! let orb = generate_sphere(0.2, 12, 12).unwrap();
//! assert_eq!(stone.triangle_count(), 12);
//! assert!(orb.vertex_count() > 0);
//! ```

pub mod extrude;
pub mod primitives;

pub use extrude::{extrude, ExtrudeOptions, ShapeOutline};
pub use primitives::*;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::picking::Aabb;

/// Errors raised when builder parameters fall outside their valid range
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("corner radius {radius} does not fit a {width}x{height} rectangle")]
    CornerRadiusTooLarge { radius: f32, width: f32, height: f32 },

    #[error("outline needs at least 3 distinct points, got {0}")]
    DegenerateOutline(usize),
}

pub(crate) fn require_positive(name: &'static str, value: f32) -> Result<f32, GeometryError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::NonPositive { name, value })
    }
}

pub(crate) fn require_non_negative(name: &'static str, value: f32) -> Result<f32, GeometryError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::Negative { name, value })
    }
}

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds unindexed geometry from loose triangles with face normals.
    ///
    /// Degenerate triangles are dropped. Texture coordinates are the planar XY
    /// projection of each vertex.
    pub fn from_triangles(triangles: &[[[f32; 3]; 3]]) -> Self {
        let mut data = Self::new();

        for triangle in triangles {
            let Some(normal) = face_normal(triangle) else {
                continue;
            };
            for corner in triangle {
                data.indices.push(data.vertices.len() as u32);
                data.vertices.push(*corner);
                data.normals.push(normal);
                data.tex_coords.push([corner[0], corner[1]]);
            }
        }

        data
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns a copy where every triangle owns its vertices and carries its face
    /// normal, giving the faceted look of flat-shaded materials.
    pub fn flat_shaded(&self) -> Self {
        let mut data = Self::new();

        for triangle in self.indices.chunks_exact(3) {
            let corners = [
                self.vertices[triangle[0] as usize],
                self.vertices[triangle[1] as usize],
                self.vertices[triangle[2] as usize],
            ];
            let normal = face_normal(&corners).unwrap_or([0.0, 1.0, 0.0]);

            for &index in triangle {
                data.indices.push(data.vertices.len() as u32);
                data.vertices.push(self.vertices[index as usize]);
                data.normals.push(normal);
                data.tex_coords.push(
                    self.tex_coords
                        .get(index as usize)
                        .copied()
                        .unwrap_or([0.0, 0.0]),
                );
            }
        }

        data
    }

    /// Local-space bounding box of all vertices
    pub fn bounds(&self) -> Aabb {
        Aabb::from_vertices(&self.vertices)
    }
}

fn face_normal(corners: &[[f32; 3]; 3]) -> Option<[f32; 3]> {
    let a = Vector3::from(corners[0]);
    let b = Vector3::from(corners[1]);
    let c = Vector3::from(corners[2]);
    let normal = (b - a).cross(c - a);

    if normal.magnitude2() <= f32::EPSILON * f32::EPSILON {
        None
    } else {
        Some(normal.normalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_shading_unshares_vertices() {
        let sphere = generate_sphere(1.0, 8, 6).unwrap();
        let flat = sphere.flat_shaded();

        assert_eq!(flat.triangle_count(), sphere.triangle_count());
        assert_eq!(flat.vertex_count(), flat.indices.len());
        for triangle in flat.normals.chunks_exact(3) {
            assert_eq!(triangle[0], triangle[1]);
            assert_eq!(triangle[1], triangle[2]);
        }
    }

    #[test]
    fn test_degenerate_triangles_are_dropped() {
        let data = GeometryData::from_triangles(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        ]);

        assert_eq!(data.triangle_count(), 1);
        assert_eq!(data.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(require_positive("radius", 0.5).is_ok());
        assert_eq!(
            require_positive("radius", -1.0),
            Err(GeometryError::NonPositive {
                name: "radius",
                value: -1.0
            })
        );
        assert!(require_non_negative("offset", 0.0).is_ok());
        assert!(require_non_negative("offset", f32::NAN).is_err());
    }
}

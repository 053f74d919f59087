use crate::gfx::{geometry::GeometryData, picking::Aabb};

use super::vertex::Vertex3D;

/// CPU-side triangle mesh. GPU buffers are created lazily by the render engine.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        Self {
            name: name.into(),
            bounds: Aabb::from_vertices(&positions),
            vertices,
            indices,
        }
    }

    pub fn from_geometry(name: impl Into<String>, geometry: &GeometryData) -> Self {
        let vertices = geometry
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: geometry.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: geometry.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();
        Self::new(name, vertices, geometry.indices.clone())
    }

    /// Builds a mesh from flat position/normal/uv arrays as produced by model loaders.
    ///
    /// Missing or mismatched normals are replaced by area-weighted smooth normals.
    pub fn from_flat_arrays(
        name: impl Into<String>,
        positions: &[f32],
        normals: &[f32],
        tex_coords: &[f32],
        indices: Vec<u32>,
    ) -> Self {
        let vertex_count = positions.len() / 3;
        let computed;
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            computed = Self::calculate_smooth_normals(positions, &indices);
            &computed
        };

        let vertices = (0..vertex_count)
            .map(|i| Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                tex_coords: if tex_coords.len() >= (i + 1) * 2 {
                    [tex_coords[i * 2], tex_coords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                },
            })
            .collect();

        Self::new(name, vertices, indices)
    }

    /// Sums unnormalized face normals into each vertex and normalizes the result.
    pub fn calculate_smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let mut normals = vec![0.0; positions.len()];
        let vertex_count = positions.len() / 3;
        let corner = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }
            let (v0, v1, v2) = (corner(i0), corner(i1), corner(i2));
            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for vertex in [i0, i1, i2] {
                for axis in 0..3 {
                    normals[vertex * 3 + axis] += face_normal[axis];
                }
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|n| *n /= length);
            } else {
                normal.copy_from_slice(&[0.0, 1.0, 0.0]);
            }
        }

        normals
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Local-space bounding box
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Iterates over triangle corner positions in local space.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|t| {
            Some([
                self.vertices.get(t[0] as usize)?.position,
                self.vertices.get(t[1] as usize)?.position,
                self.vertices.get(t[2] as usize)?.position,
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_normals_for_flat_quad() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let normals = Mesh::calculate_smooth_normals(&positions, &[0, 1, 2, 2, 3, 0]);

        for normal in normals.chunks_exact(3) {
            assert_eq!(normal, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_flat_arrays_fill_missing_attributes() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = Mesh::from_flat_arrays("tri", &positions, &[], &[], vec![0, 1, 2]);

        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.vertices()[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.triangles().count(), 1);
        assert_eq!(mesh.bounds().max.x, 1.0);
    }
}

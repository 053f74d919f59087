//! # Object Picking System
//!
//! Ray-casting from the camera through the pointer into the scene graph.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: unproject normalized device coordinates through the inverse
//!    view-projection matrix
//! 2. **Broad phase**: the ray is moved into each candidate's local space and tested
//!    against the mesh bounding box
//! 3. **Narrow phase**: triangles are tested with Möller–Trumbore
//! 4. **Ordering**: hits are returned nearest first by world-space distance
//!
//! ## Usage
//!
//! ```no_run
//! use pastel_park::gfx::camera::OrbitCamera;
//! use pastel_park::gfx::picking::Raycaster;
//! use pastel_park::gfx::scene::Scene;
//! use cgmath::{Vector2, Vector3, Zero};
//!
//! let camera = OrbitCamera::looking_at(Vector3::new(-9.0, 3.0, 2.0), Vector3::zero(), 1.5);
//! let scene = Scene::new();
//! let ray = Raycaster::ray_from_ndc(Vector2::new(0.0, 0.0), &camera);
//! let hits = Raycaster::intersect(&ray, &scene, &[]);
//! assert!(hits.is_empty());
//! ```

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector2, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::{Camera, OrbitCamera},
    scene::{NodeId, NodeKind, Scene},
};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Moves the ray by `matrix`. The direction keeps its length so that distances
    /// measured on the result are in the source space of the matrix.
    fn transformed_unnormalized(&self, matrix: &Matrix4<f32>) -> (Vector3<f32>, Vector3<f32>) {
        let origin = *matrix * self.origin.extend(1.0);
        let direction = *matrix * self.direction.extend(0.0);
        (origin.truncate() / origin.w, direction.truncate())
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Self::new(min, max)
    }

    /// Slab test. Returns the parametric entry distance, or the exit distance when the
    /// origin is inside. `direction` need not be normalized.
    pub fn intersect(&self, origin: Vector3<f32>, direction: Vector3<f32>) -> Option<f32> {
        let inv_dir = Vector3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);

        let t_min = (self.min - origin).mul_element_wise(inv_dir);
        let t_max = (self.max - origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Test ray-AABB intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        self.intersect(ray.origin, ray.direction)
    }
}

/// Möller–Trumbore ray/triangle test, both faces. Returns the parametric distance.
pub fn intersect_triangle(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    triangle: &[[f32; 3]; 3],
) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let v0 = Vector3::from(triangle[0]);
    let edge1 = Vector3::from(triangle[1]) - v0;
    let edge2 = Vector3::from(triangle[2]) - v0;

    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// One ray hit on a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub node: NodeId,
    /// World-space distance from the ray origin (the camera eye for pointer rays)
    pub distance: f32,
    /// World space intersection point
    pub point: Vector3<f32>,
}

/// Stateless ray construction and scene intersection
pub struct Raycaster;

impl Raycaster {
    /// Ray from the camera eye through a point in normalized device coordinates
    /// (x right, y up, both in `-1..=1`)
    pub fn ray_from_ndc(ndc: Vector2<f32>, camera: &OrbitCamera) -> Ray {
        let inverse = camera.build_inverse_view_projection_matrix();

        // wgpu clip space depth runs 0..1; the far point fixes the direction
        let far = inverse * Vector4::new(ndc.x, ndc.y, 1.0, 1.0);
        let far = far.truncate() / far.w;

        Ray::new(camera.eye, far - camera.eye)
    }

    /// Intersects `ray` with the meshes of `candidates`, nearest first.
    ///
    /// Non-mesh and unknown candidates are skipped; an empty candidate list yields no hits.
    pub fn intersect(ray: &Ray, scene: &Scene, candidates: &[NodeId]) -> Vec<PickResult> {
        let mut hits: Vec<PickResult> = candidates
            .iter()
            .filter_map(|&id| Self::intersect_node(ray, scene, id))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Nearest hit only
    pub fn intersect_nearest(ray: &Ray, scene: &Scene, candidates: &[NodeId]) -> Option<PickResult> {
        Self::intersect(ray, scene, candidates).into_iter().next()
    }

    fn intersect_node(ray: &Ray, scene: &Scene, id: NodeId) -> Option<PickResult> {
        let NodeKind::Mesh(mesh_node) = &scene.get(id)?.kind else {
            return None;
        };
        let world = scene.world_matrix(id);
        let inverse = world.invert()?;
        let (origin, direction) = ray.transformed_unnormalized(&inverse);

        // Parametric distances in local space equal world distances because the local
        // direction is the image of a unit world direction.
        mesh_node.mesh.bounds().intersect(origin, direction)?;

        let distance = mesh_node
            .mesh
            .triangles()
            .filter_map(|triangle| intersect_triangle(origin, direction, &triangle))
            .min_by(f32::total_cmp)?;

        Some(PickResult {
            node: id,
            distance,
            point: ray.point_at(distance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::generate_box,
        resources::material::Material,
        scene::{Mesh, NodeTree, SceneNode, Transform},
    };
    use std::sync::Arc;

    fn stone_scene() -> (Scene, Vec<NodeId>) {
        let mesh = Arc::new(Mesh::from_geometry("stone", &generate_box(1.2, 0.1, 0.7).unwrap()));
        let mut scene = Scene::new();
        let ids = [0.0, 3.0]
            .iter()
            .map(|&x| {
                scene.insert(NodeTree::new(
                    SceneNode::mesh("stone", mesh.clone(), Material::default())
                        .with_transform(Transform::from_position(x, -1.55, 0.0).with_yaw(0.5)),
                ))
            })
            .collect();
        (scene, ids)
    }

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let triangle = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let down = Vector3::new(0.0, 0.0, -1.0);

        let hit = intersect_triangle(Vector3::new(0.25, 0.25, 2.0), down, &triangle);
        assert!((hit.unwrap() - 2.0).abs() < 1e-6);
        assert!(intersect_triangle(Vector3::new(0.9, 0.9, 2.0), down, &triangle).is_none());
        assert!(intersect_triangle(Vector3::new(0.25, 0.25, -2.0), down, &triangle).is_none());
    }

    #[test]
    fn test_world_space_distance_on_transformed_node() {
        let (scene, ids) = stone_scene();
        let ray = Ray::new(Vector3::new(3.1, 10.0, 0.05), Vector3::new(0.0, -1.0, 0.0));

        let hits = Raycaster::intersect(&ray, &scene, &ids);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, ids[1]);
        // top face of the stone sits at -1.55 + 0.05
        assert!((hits[0].distance - 11.5).abs() < 1e-4);
        assert!((hits[0].point.y + 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_hits_sorted_nearest_first() {
        let (scene, ids) = stone_scene();
        let ray = Ray::new(Vector3::new(-5.0, -1.53, 0.0), Vector3::new(1.0, 0.0, 0.0));

        let hits = Raycaster::intersect(&ray, &scene, &ids);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node, ids[0]);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_empty_candidates_yield_no_hit() {
        let (scene, _) = stone_scene();
        let ray = Ray::new(Vector3::new(0.0, 10.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        assert!(Raycaster::intersect_nearest(&ray, &scene, &[]).is_none());
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera =
            OrbitCamera::looking_at(Vector3::new(-9.0, 3.0, 2.0), Vector3::zero(), 4.0 / 3.0);
        let ray = Raycaster::ray_from_ndc(Vector2::new(0.0, 0.0), &camera);
        let expected = (camera.target - camera.eye).normalize();

        assert!((ray.direction - expected).magnitude() < 1e-3);
        assert_eq!(ray.origin, camera.eye);
    }

    #[test]
    fn test_pointer_hit_distance_is_measured_from_the_eye() {
        let (scene, ids) = stone_scene();
        let target = Vector3::new(3.0, -1.5, 0.0);
        let camera = OrbitCamera::looking_at(Vector3::new(3.0, 2.0, 4.0), target, 1.0);

        let ray = Raycaster::ray_from_ndc(Vector2::new(0.0, 0.0), &camera);
        let hit = Raycaster::intersect_nearest(&ray, &scene, &ids).unwrap();

        assert_eq!(hit.node, ids[1]);
        assert!((hit.distance - (hit.point - camera.eye).magnitude()).abs() < 1e-3);
        assert!((hit.distance - (target - camera.eye).magnitude()).abs() < 1e-2);
    }
}

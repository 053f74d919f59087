//! Per-frame draw ordering
//!
//! Splits the scene into opaque and transparent draws, picks the pipeline variant for
//! each and faces sprites toward the camera. Nothing here touches the GPU.

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};

use crate::gfx::{
    resources::material::{Material, Shading, Side},
    scene::{NodeId, NodeKind, Scene},
};

/// Selects one of the park pipeline variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub shading: Shading,
    pub side: Side,
    pub transparent: bool,
}

impl PipelineKey {
    pub fn for_material(material: &Material) -> Self {
        Self {
            shading: material.shading,
            side: material.side,
            transparent: material.transparent,
        }
    }

    /// Every combination the engine registers a pipeline for
    pub fn all() -> impl Iterator<Item = PipelineKey> {
        [Shading::Lit, Shading::Unlit].into_iter().flat_map(|shading| {
            [Side::Front, Side::Back, Side::Double]
                .into_iter()
                .flat_map(move |side| {
                    [false, true].into_iter().map(move |transparent| PipelineKey {
                        shading,
                        side,
                        transparent,
                    })
                })
        })
    }

    /// Pipeline name used with the pipeline manager
    pub fn name(&self) -> String {
        format!(
            "{:?}-{:?}-{}",
            self.shading,
            self.side,
            if self.transparent { "Blend" } else { "Opaque" }
        )
    }

    pub fn cull_mode(&self) -> Option<wgpu::Face> {
        match self.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

/// One mesh or sprite to draw this frame
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: NodeId,
    pub model: Matrix4<f32>,
    pub pipeline: PipelineKey,
    pub sprite: bool,
    pub receive_shadow: bool,
    /// Squared distance from the eye to the item's origin
    pub depth: f32,
}

#[derive(Debug, Default)]
pub struct DrawList {
    pub opaque: Vec<DrawItem>,
    /// Sorted back to front
    pub transparent: Vec<DrawItem>,
    pub shadow_casters: Vec<DrawItem>,
}

impl DrawList {
    pub fn build(scene: &Scene, eye: Vector3<f32>, up: Vector3<f32>) -> Self {
        let world = scene.world_matrices();
        let mut list = Self::default();

        for (id, node) in scene.iter() {
            let (material, sprite) = match &node.kind {
                NodeKind::Mesh(mesh) => (&mesh.material, false),
                NodeKind::Sprite(material) => (material, true),
                NodeKind::Group | NodeKind::Light(_) => continue,
            };
            let Some(&matrix) = world.get(id.index()) else {
                continue;
            };
            let model = if sprite {
                billboard_matrix(matrix, eye, up)
            } else {
                matrix
            };
            let origin = model.w.truncate();
            let item = DrawItem {
                node: id,
                model,
                pipeline: PipelineKey::for_material(material),
                sprite,
                receive_shadow: node.receive_shadow,
                depth: (origin - eye).magnitude2(),
            };

            if node.cast_shadow && !sprite {
                list.shadow_casters.push(item);
            }
            if material.transparent {
                list.transparent.push(item);
            } else {
                list.opaque.push(item);
            }
        }

        list.transparent
            .sort_by(|a, b| b.depth.total_cmp(&a.depth));
        list
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps the translation and axis scales of `world` but turns the quad to face `eye`
pub fn billboard_matrix(world: Matrix4<f32>, eye: Vector3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    let center = world.w.truncate();
    let scale_x = world.x.truncate().magnitude();
    let scale_y = world.y.truncate().magnitude();
    let scale_z = world.z.truncate().magnitude();

    let to_eye = eye - center;
    if to_eye.magnitude2() < 1e-12 {
        return world;
    }
    let forward = to_eye.normalize();
    let mut right = up.cross(forward);
    if right.magnitude2() < 1e-12 {
        right = Vector3::unit_x();
    }
    let right = right.normalize();
    let up = forward.cross(right);

    Matrix4::from_cols(
        (right * scale_x).extend(0.0),
        (up * scale_y).extend(0.0),
        (forward * scale_z).extend(0.0),
        Vector4::new(center.x, center.y, center.z, 1.0),
    )
}

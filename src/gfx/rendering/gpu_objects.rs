//! Lazily uploaded GPU state for scene nodes
//!
//! Mesh buffers are shared between every node holding the same `Arc<Mesh>`, textures
//! between every material holding the same `Arc<TextureData>`. Each drawn node gets
//! its own uniform buffer and bind group (slot 1), rebuilt only when its texture
//! changes.

use std::{collections::HashMap, sync::Arc};

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    gfx::{
        geometry::generate_plane,
        resources::{
            material::{Material, MaterialUniform},
            texture_resource::{TextureData, TextureResource},
        },
        scene::{Mesh, NodeId, NodeKind, Scene},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::draw_list::DrawItem;

/// Per-object uniform content.
/// MUST match the `Object` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`
    pub normal: [[f32; 4]; 4],
    pub material: MaterialUniform,
    /// receive shadow, unused x3
    pub flags: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Matrix4<f32>, material: &Material, receive_shadow: bool) -> Self {
        let normal = model
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .transpose();
        Self {
            model: model.into(),
            normal: normal.into(),
            material: material.uniform(),
            flags: [if receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// Vertex and index buffers of one mesh
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }
}

/// Extension trait for drawing uploaded meshes
pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &GpuMesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

struct GpuObject {
    uniform: UniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
    texture: Option<Arc<TextureData>>,
}

fn arc_key<T>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as usize
}

pub struct ObjectCache {
    layout: BindGroupLayoutWithDesc,
    // Arcs are kept alive alongside so a key can never be reused by another allocation
    meshes: HashMap<usize, (Arc<Mesh>, GpuMesh)>,
    textures: HashMap<usize, (Arc<TextureData>, TextureResource)>,
    objects: HashMap<NodeId, GpuObject>,
    white: TextureResource,
    sprite_quad: GpuMesh,
}

impl ObjectCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Object Bind Group Layout");

        // Unit quad; the generator only fails on non-positive sizes
        let quad = generate_plane(1.0, 1.0)
            .map(|geometry| Mesh::from_geometry("sprite quad", &geometry))
            .unwrap_or_else(|_| Mesh::new("sprite quad", Vec::new(), Vec::new()));

        Self {
            layout,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            objects: HashMap::new(),
            white: TextureResource::create_white(device, queue),
            sprite_quad: GpuMesh::new(device, &quad),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    /// Uploads whatever `items` still need and refreshes their uniforms
    pub fn prepare<'a>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        items: impl IntoIterator<Item = &'a DrawItem>,
    ) {
        for item in items {
            let Some(node) = scene.get(item.node) else {
                continue;
            };
            let material = match &node.kind {
                NodeKind::Mesh(mesh_node) => {
                    self.meshes
                        .entry(arc_key(&mesh_node.mesh))
                        .or_insert_with(|| {
                            log::debug!("Uploading mesh '{}'", mesh_node.mesh.name);
                            (mesh_node.mesh.clone(), GpuMesh::new(device, &mesh_node.mesh))
                        });
                    &mesh_node.material
                }
                NodeKind::Sprite(material) => material,
                NodeKind::Group | NodeKind::Light(_) => continue,
            };

            if let Some(texture) = &material.texture {
                self.textures.entry(arc_key(texture)).or_insert_with(|| {
                    log::debug!("Uploading texture '{}'", texture.label);
                    (
                        texture.clone(),
                        TextureResource::create_from_texture_data(device, queue, texture),
                    )
                });
            }

            let content = ObjectUniform::new(item.model, material, item.receive_shadow);
            let stale = self.objects.get(&item.node).map_or(true, |object| {
                !same_texture(object.texture.as_ref(), material.texture.as_ref())
            });
            if stale {
                let uniform = UniformBuffer::new_with_data(device, &content);
                let bind_group = self.create_bind_group(device, &uniform, material);
                self.objects.insert(
                    item.node,
                    GpuObject {
                        uniform,
                        bind_group,
                        texture: material.texture.clone(),
                    },
                );
            } else if let Some(object) = self.objects.get_mut(&item.node) {
                object.uniform.update_content(queue, content);
            }
        }
    }

    fn create_bind_group(
        &self,
        device: &wgpu::Device,
        uniform: &UniformBuffer<ObjectUniform>,
        material: &Material,
    ) -> wgpu::BindGroup {
        let texture = material
            .texture
            .as_ref()
            .and_then(|texture| self.textures.get(&arc_key(texture)))
            .map_or(&self.white, |(_, resource)| resource);

        BindGroupBuilder::new(&self.layout)
            .resource(uniform.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, &format!("{} Object Bind Group", material.name))
    }

    pub fn bind_group(&self, node: NodeId) -> Option<&wgpu::BindGroup> {
        self.objects.get(&node).map(|object| &object.bind_group)
    }

    /// Buffers to draw `item` with; sprites share a unit quad
    pub fn mesh(&self, scene: &Scene, item: &DrawItem) -> Option<&GpuMesh> {
        if item.sprite {
            return Some(&self.sprite_quad);
        }
        match &scene.get(item.node)?.kind {
            NodeKind::Mesh(mesh_node) => self
                .meshes
                .get(&arc_key(&mesh_node.mesh))
                .map(|(_, gpu)| gpu),
            _ => None,
        }
    }
}

fn same_texture(a: Option<&Arc<TextureData>>, b: Option<&Arc<TextureData>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_object_uniform_layout() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 192);
        assert_eq!(std::mem::size_of::<ObjectUniform>() % 16, 0);
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let uniform = ObjectUniform::new(model, &Material::default(), true);
        assert_eq!(uniform.normal[0][0], 0.5);
        assert_eq!(uniform.normal[1][1], 1.0);
        assert_eq!(uniform.flags[0], 1.0);

        let moved = ObjectUniform::new(
            Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)),
            &Material::default(),
            false,
        );
        assert_eq!(moved.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(moved.flags[0], 0.0);
    }

    #[test]
    fn test_texture_identity_is_by_pointer() {
        let data = TextureData::new("moon", 1, 1, vec![255; 4]).unwrap();
        let a = Arc::new(data.clone());
        let b = Arc::new(data);
        assert!(same_texture(Some(&a), Some(&a.clone())));
        assert!(!same_texture(Some(&a), Some(&b)));
        assert!(!same_texture(Some(&a), None));
        assert!(same_texture(None, None));
    }
}

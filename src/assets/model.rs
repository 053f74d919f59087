//! glTF/GLB and OBJ model import into scene node trees

use std::{path::Path, sync::Arc};

use cgmath::{Quaternion, Vector3};

use crate::gfx::{
    resources::{
        material::{srgb_to_linear, Material, Side},
        texture_resource::TextureData,
    },
    scene::{Mesh, NodeTree, SceneNode, Transform},
};

use super::AssetError;

/// Loads a model by file extension. The returned tree has an identity-transform root
/// group named `name` holding the model's nodes.
pub fn load_model_tree(path: &Path, name: &str) -> Result<NodeTree, AssetError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let tree = match extension.as_deref() {
        Some("glb") | Some("gltf") => load_gltf(path, name)?,
        Some("obj") => load_obj(path, name)?,
        _ => return Err(AssetError::UnsupportedFormat(path.to_path_buf())),
    };

    if mesh_count(&tree) == 0 {
        return Err(AssetError::EmptyModel(path.to_path_buf()));
    }
    Ok(tree)
}

fn load_gltf(path: &Path, name: &str) -> Result<NodeTree, AssetError> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let textures: Vec<Option<Arc<TextureData>>> = images
        .iter()
        .enumerate()
        .map(|(i, image)| gltf_image_to_rgba(image, &format!("{name} image {i}")).map(Arc::new))
        .collect();
    let context = GltfContext {
        buffers: &buffers,
        textures: &textures,
    };

    let mut root = NodeTree::new(SceneNode::group(name));
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            root.push_child(context.node_tree(&node));
        }
    }
    Ok(root)
}

struct GltfContext<'a> {
    buffers: &'a [gltf::buffer::Data],
    textures: &'a [Option<Arc<TextureData>>],
}

impl GltfContext<'_> {
    fn node_tree(&self, node: &gltf::Node) -> NodeTree {
        let (translation, rotation, scale) = node.transform().decomposed();
        let name = node.name().unwrap_or("node").to_string();

        let mut tree = NodeTree::new(SceneNode::group(name.clone()).with_transform(Transform {
            position: Vector3::from(translation),
            rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: Vector3::from(scale),
        }));

        if let Some(mesh) = node.mesh() {
            for (i, primitive) in mesh.primitives().enumerate() {
                if let Some(child) = self.primitive_node(&primitive, &format!("{name}.{i}")) {
                    tree.push_child(child);
                }
            }
        }
        for child in node.children() {
            tree.push_child(self.node_tree(&child));
        }
        tree
    }

    fn primitive_node(&self, primitive: &gltf::Primitive, name: &str) -> Option<SceneNode> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("Skipping non-triangle primitive {name}");
            return None;
        }

        let reader = primitive.reader(|buffer| {
            self.buffers
                .get(buffer.index())
                .map(|data| data.0.as_slice())
        });
        let positions: Vec<f32> = reader.read_positions()?.flatten().collect();
        let normals: Vec<f32> = reader
            .read_normals()
            .map(|normals| normals.flatten().collect())
            .unwrap_or_default();
        let tex_coords: Vec<f32> = reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().flatten().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..(positions.len() / 3) as u32).collect(),
        };

        let mesh = Mesh::from_flat_arrays(name, &positions, &normals, &tex_coords, indices);
        Some(SceneNode::mesh(
            name,
            Arc::new(mesh),
            self.material(&primitive.material()),
        ))
    }

    fn material(&self, source: &gltf::Material) -> Material {
        let pbr = source.pbr_metallic_roughness();
        let [r, g, b, a] = pbr.base_color_factor();

        let mut material = Material::new(
            source.name().unwrap_or("glTF material"),
            [r, g, b],
            pbr.metallic_factor(),
            pbr.roughness_factor(),
        )
        .with_emission(source.emissive_factor(), 1.0);

        if source.alpha_mode() == gltf::material::AlphaMode::Blend {
            material = material.with_opacity(a);
        }
        if source.double_sided() {
            material = material.with_side(Side::Double);
        }
        if let Some(texture) = pbr
            .base_color_texture()
            .and_then(|info| self.textures.get(info.texture().source().index()))
            .and_then(Option::clone)
        {
            material = material.with_texture(texture);
        }
        material
    }
}

fn gltf_image_to_rgba(image: &gltf::image::Data, label: &str) -> Option<TextureData> {
    use gltf::image::Format;

    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => {
            log::debug!("Unsupported glTF image format {other:?} for {label}");
            return None;
        }
    };
    TextureData::new(label, image.width, image.height, rgba)
}

fn load_obj(path: &Path, name: &str) -> Result<NodeTree, AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No usable MTL for {}: {err}", path.display());
        Vec::new()
    });

    let mut root = NodeTree::new(SceneNode::group(name));
    for model in &models {
        let mesh = &model.mesh;
        if mesh.indices.is_empty() {
            continue;
        }

        // OBJ texture coordinates start at the bottom-left
        let tex_coords: Vec<f32> = mesh
            .texcoords
            .chunks_exact(2)
            .flat_map(|uv| [uv[0], 1.0 - uv[1]])
            .collect();
        let geometry = Mesh::from_flat_arrays(
            model.name.clone(),
            &mesh.positions,
            &mesh.normals,
            &tex_coords,
            mesh.indices.clone(),
        );

        let material = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(obj_material)
            .unwrap_or_default();
        root.push_child(SceneNode::mesh(model.name.clone(), Arc::new(geometry), material));
    }
    Ok(root)
}

fn obj_material(source: &tobj::Material) -> Material {
    let diffuse = source.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let mut material = Material::new(
        &source.name,
        diffuse.map(srgb_to_linear),
        0.0,
        // Shininess to roughness
        1.0 - (source.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
    );
    if let Some(dissolve) = source.dissolve.filter(|d| *d < 1.0) {
        material = material.with_opacity(dissolve);
    }
    material
}

/// Counts mesh nodes in a tree
pub fn mesh_count(tree: &NodeTree) -> usize {
    let mut count = 0;
    tree.visit(&mut |node| count += node.is_mesh() as usize);
    count
}

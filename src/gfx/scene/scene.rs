use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::gfx::resources::texture_resource::CubeMapData;

use super::node::{Light, NodeId, NodeKind, NodeTree, SceneNode};

/// A light resolved to world space
#[derive(Debug, Clone, Copy)]
pub struct PlacedLight<'a> {
    pub id: NodeId,
    pub light: &'a Light,
    pub position: Vector3<f32>,
}

/// Retained scene graph: every node ever inserted, in one arena.
///
/// Nodes are never removed. Parents are always stored before their children so
/// world transforms resolve in a single forward pass.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    background: Option<Arc<CubeMapData>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root-level tree and returns the id of its root node
    pub fn insert(&mut self, tree: NodeTree) -> NodeId {
        self.insert_tree(None, tree)
    }

    /// Adds a tree under an existing node. Returns `None` when `parent` is unknown.
    pub fn insert_child(&mut self, parent: NodeId, tree: NodeTree) -> Option<NodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        Some(self.insert_tree(Some(parent), tree))
    }

    fn insert_tree(&mut self, parent: Option<NodeId>, tree: NodeTree) -> NodeId {
        self.nodes.reserve(tree.len());

        let NodeTree { mut node, children } = tree;
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }

        for child in children {
            self.insert_tree(Some(id), child);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// Every node in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// World transform of one node, composed up the parent chain
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut current = self.nodes.get(id.0);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|parent| self.nodes.get(parent.0));
        }
        matrix
    }

    /// World transforms of all nodes, indexed by `NodeId::index`
    pub fn world_matrices(&self) -> Vec<Matrix4<f32>> {
        let mut matrices: Vec<Matrix4<f32>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.matrix();
            let world = match node.parent {
                Some(parent) => matrices[parent.0] * local,
                None => local,
            };
            matrices.push(world);
        }
        matrices
    }

    /// Every light with its world position
    pub fn lights(&self) -> Vec<PlacedLight<'_>> {
        let matrices = self.world_matrices();
        self.iter()
            .filter_map(|(id, node)| match &node.kind {
                NodeKind::Light(light) => Some(PlacedLight {
                    id,
                    light,
                    position: matrices[id.0].w.truncate(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn set_background(&mut self, cube_map: Arc<CubeMapData>) {
        self.background = Some(cube_map);
    }

    pub fn background(&self) -> Option<&Arc<CubeMapData>> {
        self.background.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::node::Transform;
    use cgmath::InnerSpace;

    fn lamp_like_tree() -> NodeTree {
        NodeTree::new(
            SceneNode::group("lamp").with_transform(Transform::from_position(5.0, 0.0, -5.0)),
        )
        .with_child(
            SceneNode::group("orb").with_transform(Transform::from_position(0.0, 1.95, 0.0)),
        )
        .with_child(
            NodeTree::new(SceneNode::group("holder").with_transform(Transform::from_position(
                0.0, 1.0, 0.0,
            )))
            .with_child(
                SceneNode::light("light", Light::point([1.0, 1.0, 1.0], 1.0, 5.0))
                    .with_transform(Transform::from_position(0.0, 0.5, 0.0)),
            ),
        )
    }

    #[test]
    fn test_insert_keeps_every_node() {
        let mut scene = Scene::new();
        let root = scene.insert(lamp_like_tree());
        scene.insert(NodeTree::new(SceneNode::group("other")));

        assert_eq!(scene.len(), 5);
        assert_eq!(scene.children(root).len(), 2);
        assert!(scene.find_child(root, "orb").is_some());
        assert!(scene.find_child(root, "missing").is_none());
        assert_eq!(scene.iter().count(), 5);
    }

    #[test]
    fn test_parents_precede_children() {
        let mut scene = Scene::new();
        scene.insert(lamp_like_tree());

        for (id, node) in scene.iter() {
            if let Some(parent) = node.parent() {
                assert!(parent < id);
            }
        }
    }

    #[test]
    fn test_world_matrices_compose_parents() {
        let mut scene = Scene::new();
        let root = scene.insert(lamp_like_tree());
        let holder = scene.find_child(root, "holder").unwrap();
        let light = scene.children(holder)[0];

        let matrices = scene.world_matrices();
        let position = matrices[light.index()].w.truncate();
        assert!((position - Vector3::new(5.0, 1.5, -5.0)).magnitude() < 1e-6);
        assert!((scene.world_matrix(light).w.truncate() - position).magnitude() < 1e-6);

        let lights = scene.lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].id, light);
    }

    #[test]
    fn test_insert_child_requires_known_parent() {
        let mut scene = Scene::new();
        let root = scene.insert(NodeTree::new(SceneNode::group("root")));

        let child = scene.insert_child(root, SceneNode::group("child").into());
        assert_eq!(child.and_then(|id| scene.get(id)).map(|n| n.parent()), Some(Some(root)));
        assert!(scene
            .insert_child(NodeId(99), SceneNode::group("orphan").into())
            .is_none());
        assert_eq!(scene.len(), 2);
    }
}

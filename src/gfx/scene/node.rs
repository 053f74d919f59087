//! Scene nodes, transforms, lights and the owned node trees builders produce.

use std::sync::Arc;

use cgmath::{Matrix4, One, Quaternion, Rad, Rotation3, Vector3};

use crate::gfx::resources::material::Material;

use super::mesh::Mesh;

/// Stable handle of a node inside a [`super::Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position, rotation and scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::default()
        }
    }

    /// Sets rotation from Euler angles applied in X, Y, Z order.
    pub fn with_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_euler(x, y, z);
        self
    }

    pub fn with_yaw(self, angle: f32) -> Self {
        self.with_euler(0.0, angle, 0.0)
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vector3::new(x, y, z);
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(scale, scale, scale)
    }

    pub fn set_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quaternion::from_angle_x(Rad(x))
            * Quaternion::from_angle_y(Rad(y))
            * Quaternion::from_angle_z(Rad(z));
    }

    /// Applies an additional rotation about the local Y axis.
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotation = self.rotation * Quaternion::from_angle_y(Rad(angle));
    }

    /// Translation * rotation * scale
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Shadow map parameters of a shadow-casting directional or spot light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    /// Half extent of the orthographic shadow frustum; spot lights use their cone instead
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    pub bias: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Hemisphere {
        ground_color: [f32; 3],
    },
    /// Shines from the node position toward `target` (world space)
    Directional {
        target: Vector3<f32>,
        shadow: Option<ShadowSettings>,
    },
    /// `range` of zero means unlimited
    Point {
        range: f32,
        decay: f32,
    },
    Spot {
        target: Vector3<f32>,
        angle: f32,
        penumbra: f32,
        decay: f32,
        range: f32,
        shadow: Option<ShadowSettings>,
    },
}

/// Light source. `color` is linear RGB; for hemisphere lights it is the sky color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: [f32; 3], intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn point(color: [f32; 3], intensity: f32, range: f32) -> Self {
        Self {
            kind: LightKind::Point { range, decay: 2.0 },
            color,
            intensity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeshNode {
    pub mesh: Arc<Mesh>,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    Light(Light),
    /// Camera-facing unit quad scaled by the node transform
    Sprite(Material),
}

/// A single placed element of the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Arc<Mesh>, material: Material) -> Self {
        Self::with_kind(name, NodeKind::Mesh(MeshNode { mesh, material }))
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::with_kind(name, NodeKind::Light(light))
    }

    pub fn sprite(name: impl Into<String>, material: Material) -> Self {
        Self::with_kind(name, NodeKind::Sprite(material))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(&mesh.material),
            NodeKind::Sprite(material) => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(&mut mesh.material),
            NodeKind::Sprite(material) => Some(material),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }
}

/// A node together with its owned children, not yet placed in a scene
#[derive(Debug, Clone)]
pub struct NodeTree {
    pub node: SceneNode,
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    pub fn new(node: SceneNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: impl Into<NodeTree>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn push_child(&mut self, child: impl Into<NodeTree>) {
        self.children.push(child.into());
    }

    /// Visits this node and every descendant, parents first.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut SceneNode)) {
        f(&mut self.node);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    pub fn visit(&self, f: &mut impl FnMut(&SceneNode)) {
        f(&self.node);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Total number of nodes in the tree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(NodeTree::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl From<SceneNode> for NodeTree {
    fn from(node: SceneNode) -> Self {
        Self::new(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn test_transform_order_is_trs() {
        let transform = Transform::from_position(1.0, 2.0, 3.0)
            .with_yaw(std::f32::consts::FRAC_PI_2)
            .with_uniform_scale(2.0);
        let moved = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);

        // x axis scaled to 2, rotated a quarter turn about Y onto -Z, then translated
        assert!((moved.truncate() - Vector3::new(1.0, 2.0, 1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_euler_matches_single_axis_rotation() {
        let mut transform = Transform::default();
        transform.set_euler(-std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let up = transform.matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);

        assert!((up.truncate() - Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_tree_len_and_visit() {
        let mut tree = NodeTree::new(SceneNode::group("root"))
            .with_child(SceneNode::group("a"))
            .with_child(NodeTree::new(SceneNode::group("b")).with_child(SceneNode::group("c")));

        assert_eq!(tree.len(), 4);
        tree.visit_mut(&mut |node| node.cast_shadow = true);
        let mut shadowed = 0;
        tree.visit(&mut |node| shadowed += node.cast_shadow as usize);
        assert_eq!(shadowed, 4);
    }
}

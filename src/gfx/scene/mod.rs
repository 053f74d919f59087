//! # Scene Management Module
//!
//! The retained scene graph the park is built in and the render loop draws from.
//!
//! ## Key Components
//!
//! - [`Scene`] - arena store of every placed node, never shrinks
//! - [`SceneNode`] / [`NodeTree`] - nodes and the owned trees builders return
//! - [`Mesh`] - CPU-side triangle data shared by mesh nodes
//! - [`Vertex3D`] - vertex format with position, normal and texture coordinates
//!
//! ## Usage
//!
//! ```no_run
//! use pastel_park::gfx::scene::{NodeTree, Scene, SceneNode, Transform};
//!
//! let mut scene = Scene::new();
//! let lamp = scene.insert(NodeTree::new(
//!     SceneNode::group("lamp").with_transform(Transform::from_position(5.0, 0.0, -5.0)),
//! ));
//! assert_eq!(scene.get(lamp).map(|node| node.name.as_str()), Some("lamp"));
//! ```

pub mod mesh;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use mesh::Mesh;
pub use node::{
    Light, LightKind, MeshNode, NodeId, NodeKind, NodeTree, SceneNode, ShadowSettings, Transform,
};
pub use scene::{PlacedLight, Scene};
pub use vertex::Vertex3D;

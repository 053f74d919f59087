//! # Pastel Park Prelude
//!
//! Commonly used types for building or inspecting the park without a window.
//!
//! ```no_run
//! use pastel_park::prelude::*;
//!
//! let config = ParkConfig::default();
//! let mut rng = ParkContext::rng(&config);
//! let park = ParkContext::build(&config, &mut rng, Viewport::new(1200, 800)).unwrap();
//! assert_eq!(park.interaction.stones().len(), 9);
//! ```

// Application and configuration
pub use crate::app::PastelParkApp;
pub use crate::config::{ConfigError, ParkConfig};

// Park state
pub use crate::park::{Lamp, ParkContext, PointerInteraction, Stone, Viewport};

// Scene graph and materials
pub use crate::gfx::resources::{srgb_hex, Material, Shading, Side};
pub use crate::gfx::scene::{Light, LightKind, Mesh, NodeId, NodeTree, Scene, SceneNode, Transform};

// Camera and picking
pub use crate::gfx::camera::{CameraManager, OrbitCamera};
pub use crate::gfx::picking::{PickResult, Ray, Raycaster};

// Assets
pub use crate::assets::{AssetError, AssetLoader, LoadCompletion, LoadedAsset, ModelRequest};

// Math types
pub use cgmath::{Deg, Matrix4, Rad, Vector2, Vector3};

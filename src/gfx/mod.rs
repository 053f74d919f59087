//! # Graphics Module
//!
//! Everything between the park's scene description and pixels on screen: camera,
//! procedural geometry, picking, the scene graph, GPU resources and the renderer.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - damped orbit camera and its mouse controller
//! - **Geometry** ([`geometry`]) - procedural primitives and beveled extrusion
//! - **Picking** ([`picking`]) - rays from the pointer and nearest-first hit tests
//! - **Scene Management** ([`scene`]) - retained node arena and node trees
//! - **Resource Management** ([`resources`]) - materials, textures and global uniforms
//! - **Rendering Pipeline** ([`rendering`]) - shadow, skybox and material passes
//!
//! ## Usage
//!
//! ```no_run
//! use pastel_park::gfx::{scene::Scene, OrbitCamera};
//! use cgmath::{Vector3, Zero};
//!
//! let scene = Scene::new();
//! let camera = OrbitCamera::looking_at(Vector3::new(-9.0, 3.0, 2.0), Vector3::zero(), 1.5);
//! // let render_engine = RenderEngine::new(window, width, height, &render_config).await?;
//! // render_engine.render_frame(&scene, &camera)?;
//! ```

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::{RenderEngine, RenderError};

//! # External Assets
//!
//! Background loading of models, textures, cube maps and text labels from the asset
//! root.
//!
//! Files are decoded on short-lived worker threads and handed back to the render
//! thread as [`LoadCompletion`]s through a channel. The render loop drains that
//! queue once per tick and inserts whatever succeeded; failures are logged and
//! skipped, nothing is retried.

pub mod label;
pub mod loader;
pub mod model;
pub mod texture_data;

use std::path::PathBuf;

pub use label::LabelRequest;
pub use loader::{AssetLoader, LoadCompletion, LoadId, LoadedAsset, ModelRequest};

/// Everything that can go wrong while loading one asset
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to import glTF {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to load OBJ {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse font {path}: {message}")]
    Font { path: PathBuf, message: &'static str },

    #[error("label canvas {width}x{height} has no pixels")]
    EmptyLabel { width: u32, height: u32 },

    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("model {0} contains no triangle meshes")]
    EmptyModel(PathBuf),

    #[error("cube map face {path} is {width}x{height}, expected {expected}x{expected}")]
    CubeFaceMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("could not start a loader thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("loader thread panicked while loading {0}")]
    WorkerPanicked(PathBuf),
}

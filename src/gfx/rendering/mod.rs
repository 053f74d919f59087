//! Core rendering functionality
//!
//! Handles render pipelines, per-frame draw ordering, GPU resource uploads and frame
//! rendering.

pub mod draw_list;
pub mod gpu_objects;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use draw_list::{DrawItem, DrawList, PipelineKey};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::{RenderEngine, RenderError};

// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Small builders for bind group layouts, bind groups and typed uniform buffers.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;

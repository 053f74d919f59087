//! Pastel Park
//!
//! A small decorative park rendered with wgpu and winit: a platform of stepping stones
//! that light up under the pointer, floating lamps, loaded models and a damped orbit
//! camera.

pub mod app;
pub mod assets;
pub mod config;
pub mod gfx;
pub mod park;
pub mod performance;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::PastelParkApp;

/// Creates the park application from the default config lookup
pub fn default() -> anyhow::Result<PastelParkApp> {
    let config = config::ParkConfig::from_arg(None)?;
    PastelParkApp::new(config)
}

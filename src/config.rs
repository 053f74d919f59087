//! Runtime configuration loaded from an optional TOML file
//!
//! Every field has a default, so a file only needs the sections it changes:
//!
//! ```toml
//! [scene]
//! seed = 7
//! bubble_count = 50
//!
//! [render]
//! exposure = 1.0
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "pastel_park.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ParkConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub assets: AssetConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical pixels
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Pastel Park".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of pending orbit input applied per frame
    pub damping: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [-9.0, 3.0, 2.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            damping: 0.03,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Fixed seed for rocks, trees and bubbles; OS entropy when unset
    pub seed: Option<u64>,
    pub bubble_count: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            bubble_count: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    /// Skip every file load and show only the procedural scene
    pub load_external: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
            load_external: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub exposure: f32,
    pub shadows: bool,
    pub shadow_map_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            exposure: 1.2,
            shadows: true,
            shadow_map_size: 2048,
        }
    }
}

impl ParkConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file named by `arg`, else [`DEFAULT_CONFIG_FILE`] when it exists,
    /// else the defaults.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, ConfigError> {
        match arg {
            Some(path) => Self::load(Path::new(path)),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }
}

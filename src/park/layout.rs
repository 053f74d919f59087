//! Authored placements of the park's fixed content

use std::f32::consts::PI;

/// Floor height of the platform top; most ground objects sit relative to it
pub const PLATFORM_Y: f32 = -2.0;

/// Stepping stone path as (x, y, z, yaw)
pub const STONES: [[f32; 4]; 9] = [
    [-5.0, -1.55, 0.0, PI / 2.0],
    [-4.25, -1.55, 0.0, PI / 2.15],
    [-3.5, -1.55, 0.1, PI / 2.25],
    [-2.75, -1.55, 0.3, PI / 2.4],
    [-1.95, -1.55, 0.6, PI / 2.8],
    [-1.25, -1.55, 1.1, PI / 4.0],
    [0.4, -1.55, 2.75, PI / 4.0],
    [1.0, -1.55, 3.25, PI / -1.5],
    [1.7, -1.55, 3.5, PI / -1.7],
];

pub const ROCK_Y: f32 = -1.5;

/// Rocks as (x, z, scale)
pub const ROCKS: [[f32; 3]; 5] = [
    [2.0, -3.0, 1.5],
    [-4.0, 3.0, 1.2],
    [4.0, -4.0, 1.0],
    [-3.0, 4.0, 0.8],
    [4.0, 2.0, 1.3],
];

pub const TREE_Y: f32 = -1.2;

/// Trees as (x, z, scale)
pub const TREES: [[f32; 3]; 3] = [[-3.0, 3.0, 1.2], [3.5, 0.0, 1.5], [0.0, -3.0, 1.0]];

/// Lamp posts as (x, z); the first lamp floats in a different phase
pub const LAMPS: [[f32; 2]; 4] = [[-5.0, 5.0], [5.0, -5.0], [5.0, 5.0], [-5.0, -5.0]];

pub const LAMP_HEIGHT: f32 = 4.0;

/// Sky bubble colors as sRGB hex
pub const PASTEL_PALETTE: [u32; 9] = [
    0xA2D2FF, 0xCDB4DB, 0xFFC8DD, 0xBDE0FE, 0xD0F4DE, 0xFFF1E6, 0xFDE2E4, 0xE2ECE9, 0xBEE1E6,
];

pub const MOON_POSITION: [f32; 3] = [6.0, 7.0, -6.0];
pub const MOON_TEXTURE: &str = "moonmap4k.jpg";

/// Per-frame moon spin about Y in radians
pub const MOON_SPIN: f32 = 0.005;

pub const SPRITE_POSITION: [f32; 3] = [-4.0, 1.0, -4.0];
pub const SIGN_TEXT: &str = "Welcome to Pastel Park!";
pub const SIGN_FONT: &str = "fonts/DejaVuSans-Bold.ttf";
pub const SIGN_FONT_PX: f32 = 40.0;
/// Label canvas in pixels
pub const SIGN_CANVAS: [u32; 2] = [512, 256];

/// Cube map faces ordered +X, -X, +Y, -Y, +Z, -Z
pub const SKYBOX_FACES: [&str; 6] = [
    "skyleftx.png",
    "skyrightx.png",
    "skyupy.png",
    "skydowny.png",
    "skyfrontz.png",
    "skybackz.png",
];

pub const FENCE_MODEL: &str = "White Picket Fence.glb";
pub const FENCE_Y: f32 = -1.15;

/// Fence panels around the perimeter as (x, z, yaw)
pub const FENCES: [[f32; 3]; 19] = [
    [-4.0, -5.0, 0.0],
    [-2.0, -5.0, 0.0],
    [0.0, -5.0, 0.0],
    [2.0, -5.0, 0.0],
    [4.0, -5.0, 0.0],
    [5.0, -4.0, PI / 2.0],
    [5.0, -2.0, PI / 2.0],
    [5.0, 0.0, PI / 2.0],
    [5.0, 2.0, PI / 2.0],
    [5.0, 4.0, PI / 2.0],
    [4.0, 5.0, PI],
    [2.0, 5.0, PI],
    [0.0, 5.0, PI],
    [-2.0, 5.0, PI],
    [-4.0, 5.0, PI],
    [-5.0, 4.0, -PI / 2.0],
    [-5.0, 2.0, -PI / 2.0],
    [-5.0, -2.0, -PI / 2.0],
    [-5.0, -4.0, -PI / 2.0],
];

pub const TULIP_MODEL: &str = "Tulip.glb";
pub const TULIP_Y: f32 = -1.3;
pub const TULIP_SCALE: f32 = 0.4;

/// Tulips as (x, z, yaw)
pub const TULIPS: [[f32; 3]; 7] = [
    [-3.0, -2.0, 0.0],
    [-1.0, -3.0, PI / 4.0],
    [-2.5, 3.0, PI / 2.0],
    [1.0, -2.0, PI / 6.0],
    [-1.0, 0.0, PI / 3.0],
    [4.0, -1.0, PI],
    [5.0, 4.0, PI / 8.0],
];

/// A single authored model placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPlacement {
    pub path: &'static str,
    pub name: &'static str,
    pub position: [f32; 3],
    pub scale: f32,
    pub yaw: f32,
}

pub const MODELS: [ModelPlacement; 4] = [
    ModelPlacement {
        path: "Kangaroo.glb",
        name: "Kangaroo",
        position: [2.0, -1.5, -1.0],
        scale: 0.15,
        yaw: PI / 1.5,
    },
    ModelPlacement {
        path: "Bridge.glb",
        name: "Bridge",
        position: [-0.5, -0.9, 1.85],
        scale: 0.4,
        yaw: PI / 4.0,
    },
    ModelPlacement {
        path: "Bench.glb",
        name: "Bench",
        position: [-2.8, -1.3, -4.0],
        scale: 0.6,
        yaw: PI,
    },
    ModelPlacement {
        path: "Bench.glb",
        name: "Bench",
        position: [-4.0, -1.3, -2.8],
        scale: 0.6,
        yaw: -PI / 2.0,
    },
];

pub const POND: ModelPlacement = ModelPlacement {
    path: "Pond.glb",
    name: "Pond",
    position: [2.8, -1.45, 4.0],
    scale: 1.0,
    yaw: PI / 4.6,
};

pub const WATER_POSITION: [f32; 3] = [2.8, -1.55, 3.9];
pub const WATER_YAW: f32 = PI / -5.7;

pub const BILLBOARD_MODEL: &str = "Billboard/Billboard.obj";
pub const BILLBOARD_POSITION: [f32; 3] = [-4.0, -1.55, -4.0];
pub const BILLBOARD_SCALE: [f32; 3] = [0.01, 0.01, 0.001];
pub const BILLBOARD_YAW: f32 = PI / 4.0;

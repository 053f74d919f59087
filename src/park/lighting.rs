//! The park's fixed light rig

use cgmath::Vector3;
use std::f32::consts::PI;

use crate::gfx::{
    resources::material::srgb_hex,
    scene::{Light, LightKind, NodeTree, SceneNode, ShadowSettings, Transform},
};

pub const SUN_POSITION: [f32; 3] = [5.0, 8.0, 2.0];
pub const SPOT_POSITION: [f32; 3] = [0.0, 8.0, 0.0];
pub const SPOT_RANGE: f32 = 30.0;
pub const SPOT_SHADOW_MAP_SIZE: u32 = 1024;

pub fn sun_shadow(map_size: u32) -> ShadowSettings {
    ShadowSettings {
        map_size,
        extent: 15.0,
        near: 0.5,
        far: 50.0,
        bias: -0.0005,
    }
}

/// Perspective shadow of the overhead spot, spanning its cone out to its range
pub fn spot_shadow(map_size: u32) -> ShadowSettings {
    ShadowSettings {
        map_size,
        extent: 0.0,
        near: 0.5,
        far: SPOT_RANGE,
        bias: 0.0,
    }
}

/// Ambient, sun, hemisphere, warm point and overhead spot lights.
///
/// The sun and the spot cast shadows; `shadow_map_size` sets the sun's map and `None`
/// turns both shadows off.
pub fn light_rig(shadow_map_size: Option<u32>) -> Vec<NodeTree> {
    let [sx, sy, sz] = SUN_POSITION;
    let [px, py, pz] = SPOT_POSITION;

    vec![
        SceneNode::light("ambient light", Light::ambient(srgb_hex(0xFFF2E6), 0.5)).into(),
        SceneNode::light(
            "sun",
            Light {
                kind: LightKind::Directional {
                    target: Vector3::new(0.0, 0.0, 0.0),
                    shadow: shadow_map_size.map(sun_shadow),
                },
                color: srgb_hex(0xFFF0DD),
                intensity: 0.8,
            },
        )
        .with_transform(Transform::from_position(sx, sy, sz))
        .into(),
        SceneNode::light(
            "hemisphere light",
            Light {
                kind: LightKind::Hemisphere {
                    ground_color: srgb_hex(0xFFE0B3),
                },
                color: srgb_hex(0xC2E0FF),
                intensity: 0.3,
            },
        )
        .into(),
        SceneNode::light("warm light", Light::point(srgb_hex(0xFFAA44), 0.6, 20.0))
            .with_transform(Transform::from_position(-3.0, 4.0, 2.0))
            .into(),
        SceneNode::light(
            "spot light",
            Light {
                kind: LightKind::Spot {
                    target: Vector3::new(0.0, 0.0, 0.0),
                    angle: PI / 6.0,
                    penumbra: 0.2,
                    decay: 1.5,
                    range: SPOT_RANGE,
                    shadow: shadow_map_size.map(|_| spot_shadow(SPOT_SHADOW_MAP_SIZE)),
                },
                color: srgb_hex(0xFFF0DD),
                intensity: 0.5,
            },
        )
        .with_transform(Transform::from_position(px, py, pz))
        .into(),
    ]
}

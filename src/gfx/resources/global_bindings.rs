//! Global uniform bindings for camera and scene data
//!
//! Manages the uniform buffer and bind group for per-frame state shared by every
//! draw: camera matrices, the resolved light rig and tone mapping parameters.
//! Bound to slot 0 in all render pipelines.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};

use crate::{
    gfx::{
        camera::{orbit_camera::OPENGL_TO_WGPU_MATRIX, Camera, OrbitCamera},
        scene::{LightKind, PlacedLight, ShadowSettings},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Point lights beyond this count are ignored
pub const MAX_POINT_LIGHTS: usize = 8;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    /// xyz world position, w range (0 = unlimited)
    pub position_range: [f32; 4],
    /// rgb color * intensity, w decay exponent
    pub color_decay: [f32; 4],
}

/// Global uniform buffer content.
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub spot_view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub ambient: [f32; 4],
    pub sky_color: [f32; 4],
    pub ground_color: [f32; 4],
    /// xyz unit vector toward the light, w = 1 when a shadow map is in use
    pub directional_dir: [f32; 4],
    pub directional_color: [f32; 4],
    pub spot_position_range: [f32; 4],
    pub spot_direction_decay: [f32; 4],
    pub spot_color: [f32; 4],
    /// cos outer, cos inner, enabled, w = 1 when the spot shadow map is in use
    pub spot_cone: [f32; 4],
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    /// point light count, exposure, sun shadow bias, spot shadow bias
    pub params: [f32; 4],
}

fn scaled(color: [f32; 3], intensity: f32) -> [f32; 4] {
    [
        color[0] * intensity,
        color[1] * intensity,
        color[2] * intensity,
        1.0,
    ]
}

fn light_view(position: Vector3<f32>, target: Vector3<f32>) -> Matrix4<f32> {
    let direction = (target - position).normalize();
    // look_at_rh degenerates when looking straight along the up vector
    let up = if direction.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    Matrix4::look_at_rh(
        Point3::new(position.x, position.y, position.z),
        Point3::new(target.x, target.y, target.z),
        up,
    )
}

/// View-projection of an orthographic shadow camera at `position` looking at `target`
pub fn shadow_view_proj(
    position: Vector3<f32>,
    target: Vector3<f32>,
    settings: &ShadowSettings,
) -> Matrix4<f32> {
    let e = settings.extent;
    let projection = cgmath::ortho(-e, e, -e, e, settings.near, settings.far);
    OPENGL_TO_WGPU_MATRIX * projection * light_view(position, target)
}

/// View-projection of a spot light's shadow camera; the frustum covers the cone
/// (`angle` is the half angle)
pub fn spot_shadow_view_proj(
    position: Vector3<f32>,
    target: Vector3<f32>,
    angle: f32,
    settings: &ShadowSettings,
) -> Matrix4<f32> {
    let projection = cgmath::perspective(Rad(angle * 2.0), 1.0, settings.near, settings.far);
    OPENGL_TO_WGPU_MATRIX * projection * light_view(position, target)
}

/// Shadow settings of the lights the renderer draws shadow maps for: the first
/// directional and the first spot light, matching what [`GlobalUniform`] resolves
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShadowCasters {
    pub sun: Option<ShadowSettings>,
    pub spot: Option<ShadowSettings>,
}

impl ShadowCasters {
    pub fn from_lights(lights: &[PlacedLight]) -> Self {
        let sun = lights
            .iter()
            .find_map(|placed| match placed.light.kind {
                LightKind::Directional { shadow, .. } => Some(shadow),
                _ => None,
            })
            .flatten();
        let spot = lights
            .iter()
            .find_map(|placed| match placed.light.kind {
                LightKind::Spot { shadow, .. } => Some(shadow),
                _ => None,
            })
            .flatten();
        Self { sun, spot }
    }
}

impl GlobalUniform {
    /// Resolves the camera and every placed light into shader form.
    ///
    /// Ambient and hemisphere lights add up. The first directional and spot light
    /// are used, later ones are ignored.
    pub fn new(camera: &OrbitCamera, lights: &[PlacedLight], exposure: f32) -> Self {
        let view_proj = camera.build_view_projection_matrix();
        let mut uniform = Self {
            view_proj: view_proj.into(),
            inv_view_proj: view_proj
                .invert()
                .unwrap_or_else(Matrix4::identity)
                .into(),
            light_view_proj: Matrix4::identity().into(),
            spot_view_proj: Matrix4::identity().into(),
            eye: [camera.eye.x, camera.eye.y, camera.eye.z, 1.0],
            ambient: [0.0; 4],
            sky_color: [0.0; 4],
            ground_color: [0.0; 4],
            directional_dir: [0.0, 1.0, 0.0, 0.0],
            directional_color: [0.0; 4],
            spot_position_range: [0.0; 4],
            spot_direction_decay: [0.0, -1.0, 0.0, 0.0],
            spot_color: [0.0; 4],
            spot_cone: [1.0, 1.0, 0.0, 0.0],
            point_lights: [PointLightUniform::default(); MAX_POINT_LIGHTS],
            params: [0.0, exposure, 0.0, 0.0],
        };

        let mut has_directional = false;
        let mut has_spot = false;
        let mut point_count = 0;

        for placed in lights {
            let light = placed.light;
            match light.kind {
                LightKind::Ambient => {
                    for (channel, value) in uniform.ambient.iter_mut().zip(light.color) {
                        *channel += value * light.intensity;
                    }
                }
                LightKind::Hemisphere { ground_color } => {
                    uniform.sky_color = scaled(light.color, light.intensity);
                    uniform.ground_color = scaled(ground_color, light.intensity);
                }
                LightKind::Directional { target, shadow } if !has_directional => {
                    has_directional = true;
                    let toward = (placed.position - target).normalize();
                    let shadowed = if let Some(settings) = shadow {
                        uniform.light_view_proj =
                            shadow_view_proj(placed.position, target, &settings).into();
                        uniform.params[2] = settings.bias;
                        1.0
                    } else {
                        0.0
                    };
                    uniform.directional_dir = [toward.x, toward.y, toward.z, shadowed];
                    uniform.directional_color = scaled(light.color, light.intensity);
                }
                LightKind::Spot {
                    target,
                    angle,
                    penumbra,
                    decay,
                    range,
                    shadow,
                } if !has_spot => {
                    has_spot = true;
                    let direction = (target - placed.position).normalize();
                    let p = placed.position;
                    let shadowed = if let Some(settings) = shadow {
                        uniform.spot_view_proj =
                            spot_shadow_view_proj(placed.position, target, angle, &settings).into();
                        uniform.params[3] = settings.bias;
                        1.0
                    } else {
                        0.0
                    };
                    uniform.spot_position_range = [p.x, p.y, p.z, range];
                    uniform.spot_direction_decay = [direction.x, direction.y, direction.z, decay];
                    uniform.spot_color = scaled(light.color, light.intensity);
                    uniform.spot_cone = [
                        angle.cos(),
                        (angle * (1.0 - penumbra)).cos(),
                        1.0,
                        shadowed,
                    ];
                }
                LightKind::Point { range, decay } if point_count < MAX_POINT_LIGHTS => {
                    let p = placed.position;
                    let color = scaled(light.color, light.intensity);
                    uniform.point_lights[point_count] = PointLightUniform {
                        position_range: [p.x, p.y, p.z, range],
                        color_decay: [color[0], color[1], color[2], decay],
                    };
                    point_count += 1;
                }
                _ => log::trace!("Light {:?} exceeds the supported rig, skipped", placed.id),
            }
        }

        uniform.params[0] = point_count as f32;
        uniform
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Manages the bind group layout and bind group for global uniforms
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    /// Sets up the layout; the bind group is created by `create_bind_group()`
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // camera + lights
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    /// Used when creating render pipelines that need access to global uniforms
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// `None` until `create_bind_group()` has been called
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{Light, NodeTree, Scene, SceneNode, Transform};
    use cgmath::Zero;

    fn camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vector3::new(-9.0, 3.0, 2.0), Vector3::zero(), 1.0)
    }

    #[test]
    fn test_uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 688);
    }

    #[test]
    fn test_point_lights_are_capped() {
        let mut scene = Scene::new();
        for i in 0..10 {
            scene.insert(NodeTree::new(
                SceneNode::light("point", Light::point([1.0, 1.0, 1.0], 1.0, 5.0))
                    .with_transform(Transform::from_position(i as f32, 0.0, 0.0)),
            ));
        }
        scene.insert(NodeTree::new(SceneNode::light(
            "ambient",
            Light::ambient([1.0, 0.5, 0.0], 0.5),
        )));

        let uniform = GlobalUniform::new(&camera(), &scene.lights(), 1.2);
        assert_eq!(uniform.params[0], MAX_POINT_LIGHTS as f32);
        assert_eq!(uniform.params[1], 1.2);
        assert_eq!(uniform.point_lights[3].position_range, [3.0, 0.0, 0.0, 5.0]);
        assert_eq!(&uniform.ambient[..3], &[0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_directional_shadow_setup() {
        let settings = ShadowSettings {
            map_size: 2048,
            extent: 15.0,
            near: 0.5,
            far: 50.0,
            bias: -0.0005,
        };
        let mut scene = Scene::new();
        scene.insert(NodeTree::new(
            SceneNode::light(
                "sun",
                Light {
                    kind: LightKind::Directional {
                        target: Vector3::zero(),
                        shadow: Some(settings),
                    },
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.8,
                },
            )
            .with_transform(Transform::from_position(5.0, 8.0, 2.0)),
        ));

        let uniform = GlobalUniform::new(&camera(), &scene.lights(), 1.0);
        assert_eq!(uniform.directional_dir[3], 1.0);
        assert_eq!(uniform.params[2], -0.0005);

        // The origin projects to the center of the shadow map
        let projected = Matrix4::from(uniform.light_view_proj) * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(projected.x.abs() < 1e-5 && projected.y.abs() < 1e-5);
        assert!(projected.z > 0.0 && projected.z < 1.0);
    }

    #[test]
    fn test_spot_shadow_covers_the_cone() {
        let settings = ShadowSettings {
            map_size: 1024,
            extent: 0.0,
            near: 0.5,
            far: 30.0,
            bias: 0.0,
        };
        let mut scene = Scene::new();
        scene.insert(NodeTree::new(
            SceneNode::light(
                "spot",
                Light {
                    kind: LightKind::Spot {
                        target: Vector3::zero(),
                        angle: std::f32::consts::PI / 6.0,
                        penumbra: 0.2,
                        decay: 1.5,
                        range: 30.0,
                        shadow: Some(settings),
                    },
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.5,
                },
            )
            .with_transform(Transform::from_position(0.0, 8.0, 0.0)),
        ));

        let uniform = GlobalUniform::new(&camera(), &scene.lights(), 1.0);
        assert_eq!(uniform.spot_cone[2], 1.0);
        assert_eq!(uniform.spot_cone[3], 1.0);
        assert_eq!(uniform.directional_dir[3], 0.0);

        let project = |x: f32, y: f32, z: f32| {
            let clip = Matrix4::from(uniform.spot_view_proj) * cgmath::Vector4::new(x, y, z, 1.0);
            clip.truncate() / clip.w
        };
        let center = project(0.0, 0.0, 0.0);
        assert!(center.x.abs() < 1e-5 && center.y.abs() < 1e-5);
        assert!(center.z > 0.0 && center.z < 1.0);

        // 2 units off axis at 8 below is inside the 30 degree cone, 10 units is not
        let inside = project(2.0, 0.0, 0.0);
        assert!(inside.x.abs() < 1.0 && inside.y.abs() < 1.0);
        let outside = project(10.0, 0.0, 0.0);
        assert!(outside.x.abs() > 1.0 || outside.y.abs() > 1.0);
    }

    #[test]
    fn test_shadow_casters_follow_the_first_lights() {
        let mut scene = Scene::new();
        for tree in crate::park::lighting::light_rig(Some(2048)) {
            scene.insert(tree);
        }
        let casters = ShadowCasters::from_lights(&scene.lights());
        assert_eq!(casters.sun.map(|settings| settings.map_size), Some(2048));
        assert_eq!(casters.spot.map(|settings| settings.map_size), Some(1024));

        let mut dark = Scene::new();
        for tree in crate::park::lighting::light_rig(None) {
            dark.insert(tree);
        }
        assert_eq!(ShadowCasters::from_lights(&dark.lights()), ShadowCasters::default());
    }

    #[test]
    fn test_unshadowed_spot_leaves_the_flag_clear() {
        let mut scene = Scene::new();
        scene.insert(NodeTree::new(
            SceneNode::light(
                "spot",
                Light {
                    kind: LightKind::Spot {
                        target: Vector3::zero(),
                        angle: 0.5,
                        penumbra: 0.0,
                        decay: 2.0,
                        range: 0.0,
                        shadow: None,
                    },
                    color: [1.0, 1.0, 1.0],
                    intensity: 1.0,
                },
            )
            .with_transform(Transform::from_position(0.0, 4.0, 0.0)),
        ));
        let uniform = GlobalUniform::new(&camera(), &scene.lights(), 1.0);
        assert_eq!(uniform.spot_cone[3], 0.0);
        assert_eq!(uniform.params[3], 0.0);
    }
}

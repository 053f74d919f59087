//! # Pastel Park
//!
//! The park scene and everything that changes it frame to frame.
//!
//! [`ParkContext`] owns the scene graph, the camera, the stepping stone selection,
//! the floating lamps and the asset loader. The window loop feeds it input events
//! and calls [`ParkContext::tick`] once per frame before drawing.

pub mod builders;
pub mod interaction;
pub mod lamps;
pub mod layout;
pub mod lighting;

use std::{path::PathBuf, time::Duration};

use cgmath::{Deg, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};

use crate::{
    assets::{AssetLoader, LoadCompletion, LoadedAsset, ModelRequest},
    config::{CameraConfig, ParkConfig},
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera},
        geometry::GeometryError,
        resources::material::Material,
        scene::{NodeId, Scene, Transform},
    },
};

pub use interaction::{PointerInteraction, Stone};
pub use lamps::{FloatAnimation, Lamp};

/// Drawable size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Mutable state of the running park, owned by the render thread
pub struct ParkContext {
    pub scene: Scene,
    pub camera: CameraManager,
    pub interaction: PointerInteraction,
    pub lamps: Vec<Lamp>,
    pub moon: NodeId,
    pub sign: NodeId,
    pub viewport: Viewport,
    loader: AssetLoader,
    load_external: bool,
}

impl ParkContext {
    /// Builds the procedural park. External assets are requested separately with
    /// [`ParkContext::request_assets`].
    pub fn build<R: Rng>(
        config: &ParkConfig,
        rng: &mut R,
        viewport: Viewport,
    ) -> Result<Self, GeometryError> {
        let mut scene = Scene::new();

        scene.insert(builders::build_platform()?);

        let mut stones = Vec::with_capacity(layout::STONES.len());
        for tree in builders::build_stepping_stones()? {
            let id = scene.insert(tree);
            stones.extend(Stone::from_scene(&scene, id));
        }

        for [x, z, scale] in layout::ROCKS {
            scene.insert(builders::build_rock(x, z, scale, rng)?);
        }
        for [x, z, scale] in layout::TREES {
            scene.insert(builders::build_tree(x, z, scale, rng)?);
        }
        scene.insert(builders::build_sky_bubbles(config.scene.bubble_count, rng)?);

        let mut lamps = Vec::with_capacity(layout::LAMPS.len());
        for (tree, animation) in builders::build_lamps()? {
            lamps.extend(Lamp::insert(&mut scene, tree, animation));
        }

        let moon = scene.insert(builders::build_moon()?);
        let sign = scene.insert(builders::build_welcome_sprite());

        let shadow_map_size = config.render.shadows.then_some(config.render.shadow_map_size);
        for light in lighting::light_rig(shadow_map_size) {
            scene.insert(light);
        }

        log::info!(
            "Built park: {} nodes, {} stepping stones, {} lamps",
            scene.len(),
            stones.len(),
            lamps.len()
        );

        Ok(Self {
            scene,
            camera: camera_manager(&config.camera, viewport),
            interaction: PointerInteraction::new(stones),
            lamps,
            moon,
            sign,
            viewport,
            loader: AssetLoader::new(&config.assets.root),
            load_external: config.assets.load_external,
        })
    }

    /// Generator for the random park features: seeded when the config pins a seed
    pub fn rng(config: &ParkConfig) -> StdRng {
        match config.scene.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Starts background loads for the skybox, moon texture, welcome sign text and
    /// every model.
    pub fn request_assets(&mut self) {
        if !self.load_external {
            log::info!("External assets disabled");
            return;
        }

        self.loader
            .load_cube_map(layout::SKYBOX_FACES.map(PathBuf::from));
        self.loader.load_texture(layout::MOON_TEXTURE, self.moon);
        self.loader
            .load_label(layout::SIGN_FONT, builders::welcome_label(), self.sign);

        for placement in layout::MODELS {
            self.loader.load_model(model_request(&placement));
        }

        for [x, z, yaw] in layout::FENCES {
            self.loader.load_model(ModelRequest::new(
                layout::FENCE_MODEL,
                "White Picket Fence",
                Transform::from_position(x, layout::FENCE_Y, z).with_yaw(yaw),
            ));
        }

        match builders::build_water() {
            Ok(water) => {
                self.loader
                    .load_model(model_request(&layout::POND).with_attachment(water));
            }
            Err(err) => log::warn!("Skipping pond water: {err}"),
        }

        for [x, z, yaw] in layout::TULIPS {
            self.loader.load_model(ModelRequest::new(
                layout::TULIP_MODEL,
                "Tulip",
                Transform::from_position(x, layout::TULIP_Y, z)
                    .with_yaw(yaw)
                    .with_uniform_scale(layout::TULIP_SCALE),
            ));
        }

        let [x, y, z] = layout::BILLBOARD_POSITION;
        let [sx, sy, sz] = layout::BILLBOARD_SCALE;
        self.loader.load_model(
            ModelRequest::new(
                layout::BILLBOARD_MODEL,
                "Billboard",
                Transform::from_position(x, y, z)
                    .with_yaw(layout::BILLBOARD_YAW)
                    .with_scale(sx, sy, sz),
            )
            .with_material_override(Material::new("billboard", [1.0, 1.0, 1.0], 0.2, 0.8)),
        );

        log::info!(
            "Requested {} assets from {}",
            self.loader.in_flight(),
            self.loader.root().display()
        );
    }

    /// Feeds window input to the pointer and camera. Returns true when consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.interaction.pointer_moved(
                    position.x,
                    position.y,
                    self.viewport.width,
                    self.viewport.height,
                );
                false
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                self.camera.process_window_event(event);
                self.click();
                true
            }
            _ => self.camera.process_window_event(event),
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        self.camera.process_device_event(event);
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.interaction
            .pointer_moved(x, y, self.viewport.width, self.viewport.height);
    }

    /// Selects the stone under the pointer or clears the selection
    pub fn click(&mut self) {
        self.interaction.click(&mut self.scene, &self.camera.camera);
    }

    /// Updates the camera aspect and the viewport; the camera does not move.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport::new(width, height);
        self.camera.resize(width, height);
    }

    /// One frame of park updates at wall-clock time `now_ms`.
    pub fn tick(&mut self, now_ms: f64) {
        let completions = self.loader.drain();
        self.apply_completions(completions);

        self.interaction
            .update_hover(&mut self.scene, &self.camera.camera);
        lamps::animate_lamps(&self.lamps, &mut self.scene, now_ms);
        if let Some(moon) = self.scene.get_mut(self.moon) {
            moon.transform.rotate_y(layout::MOON_SPIN);
        }
        self.camera.update();
    }

    /// Inserts finished loads into the scene; failures are logged and dropped.
    pub fn apply_completions(&mut self, completions: Vec<LoadCompletion>) {
        for completion in completions {
            let path = completion.path.display();
            match completion.result {
                Ok(LoadedAsset::Model { tree, attachments }) => {
                    log::info!("Loaded model {path} ({} nodes)", tree.len());
                    self.scene.insert(tree);
                    for attachment in attachments {
                        self.scene.insert(attachment);
                    }
                }
                Ok(LoadedAsset::Texture { target, texture }) => {
                    match self.scene.get_mut(target).and_then(|node| node.material_mut()) {
                        Some(material) => {
                            log::info!("Loaded texture {path}");
                            material.texture = Some(texture);
                        }
                        None => log::warn!("Texture {path} has no material to attach to"),
                    }
                }
                Ok(LoadedAsset::CubeMap(cube_map)) => {
                    log::info!("Loaded skybox starting at {path}");
                    self.scene.set_background(cube_map);
                }
                Err(err) => log::warn!("Failed to load asset #{}: {err}", completion.id),
            }
        }
    }

    /// Blocks until every pending load finished or `timeout` elapsed, then applies them.
    pub fn wait_for_assets(&mut self, timeout: Duration) {
        let completions = self.loader.wait_idle(timeout);
        self.apply_completions(completions);
    }

    pub fn assets_in_flight(&self) -> usize {
        self.loader.in_flight()
    }
}

fn model_request(placement: &layout::ModelPlacement) -> ModelRequest {
    let [x, y, z] = placement.position;
    ModelRequest::new(
        placement.path,
        placement.name,
        Transform::from_position(x, y, z)
            .with_yaw(placement.yaw)
            .with_uniform_scale(placement.scale),
    )
}

fn camera_manager(config: &CameraConfig, viewport: Viewport) -> CameraManager {
    let mut camera = OrbitCamera::looking_at(
        Vector3::from(config.position),
        Vector3::from(config.target),
        viewport.aspect(),
    );
    camera.fovy = Deg(config.fov_degrees).into();
    camera.znear = config.near;
    camera.zfar = config.far;
    camera.damping = config.damping.clamp(0.0, 1.0);

    CameraManager::new(
        camera,
        CameraController::new(config.zoom_speed, viewport.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::NodeKind;
    use cgmath::InnerSpace;

    fn test_config(root: PathBuf) -> ParkConfig {
        let mut config = ParkConfig::default();
        config.scene.seed = Some(11);
        config.assets.root = root;
        config
    }

    fn park(config: &ParkConfig) -> ParkContext {
        let mut rng = ParkContext::rng(config);
        ParkContext::build(config, &mut rng, Viewport::new(800, 600)).unwrap()
    }

    fn missing_root() -> PathBuf {
        std::env::temp_dir().join(format!("pastel_park_missing_{}", std::process::id()))
    }

    #[test]
    fn test_build_places_the_fixed_content() {
        let context = park(&test_config(missing_root()));

        assert_eq!(context.interaction.stones().len(), 9);
        assert_eq!(context.lamps.len(), 4);
        assert_eq!(context.scene.lights().len(), 5 + 4);
        assert_eq!(context.scene.get(context.moon).unwrap().name, "moon");
        assert!(context
            .scene
            .iter()
            .any(|(_, node)| matches!(node.kind, NodeKind::Sprite(_))));
        assert!((context.camera.camera.eye - Vector3::new(-9.0, 3.0, 2.0)).magnitude() < 1e-4);
    }

    #[test]
    fn test_same_seed_builds_the_same_park() {
        let config = test_config(missing_root());
        let a = park(&config);
        let b = park(&config);

        assert_eq!(a.scene.len(), b.scene.len());
        for ((_, left), (_, right)) in a.scene.iter().zip(b.scene.iter()) {
            assert_eq!(left.transform, right.transform);
        }
    }

    #[test]
    fn test_resize_changes_aspect_not_eye() {
        let mut context = park(&test_config(missing_root()));
        let eye = context.camera.camera.eye;

        context.resize(1920, 1080);

        assert_eq!(context.viewport, Viewport::new(1920, 1080));
        assert!((context.camera.camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(context.camera.camera.eye, eye);

        context.resize(0, 0);
        assert_eq!(context.viewport, Viewport::new(1920, 1080));
    }

    #[test]
    fn test_missing_assets_insert_nothing() {
        let mut context = park(&test_config(missing_root()));
        let before = context.scene.len();

        context.request_assets();
        assert!(context.assets_in_flight() > 0);
        context.wait_for_assets(Duration::from_secs(30));
        context.tick(0.0);

        assert_eq!(context.assets_in_flight(), 0);
        assert_eq!(context.scene.len(), before);
        assert!(context.scene.background().is_none());
        let moon = context.scene.get(context.moon).unwrap();
        assert!(moon.material().unwrap().texture.is_none());
        let sign = context.scene.get(context.sign).unwrap();
        assert!(sign.material().unwrap().texture.is_none());
    }

    #[test]
    fn test_welcome_sign_is_textured_once_its_font_loads() {
        let root = std::env::temp_dir().join(format!("pastel_park_sign_{}", std::process::id()));
        std::fs::create_dir_all(root.join("fonts")).unwrap();
        std::fs::copy(
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources").join(layout::SIGN_FONT),
            root.join(layout::SIGN_FONT),
        )
        .unwrap();

        let mut context = park(&test_config(root));
        let before = context.scene.len();
        let untextured = context.scene.get(context.sign).unwrap().material().unwrap().clone();
        assert!(untextured.texture.is_none());

        context.request_assets();
        context.wait_for_assets(Duration::from_secs(30));

        // only the sign changed; every model is missing from this root
        assert_eq!(context.scene.len(), before);
        let material = context.scene.get(context.sign).unwrap().material().unwrap();
        let texture = material.texture.as_ref().unwrap();
        assert_eq!((texture.width, texture.height), (512, 256));
        assert!(texture.rgba.chunks_exact(4).any(|texel| texel[0] < 64));
        assert_eq!(material.base_color, untextured.base_color);
    }

    #[test]
    fn test_loaded_model_is_inserted_with_shadows() {
        let root = std::env::temp_dir().join(format!("pastel_park_models_{}", std::process::id()));
        std::fs::create_dir_all(root.join("Billboard")).unwrap();
        std::fs::write(
            root.join(layout::BILLBOARD_MODEL),
            "o Sign\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        )
        .unwrap();

        let mut context = park(&test_config(root));
        let before = context.scene.len();
        context.request_assets();
        context.wait_for_assets(Duration::from_secs(30));

        // group plus one mesh; everything else is missing
        assert_eq!(context.scene.len(), before + 2);
        let (_, sign) = context
            .scene
            .iter()
            .find(|(_, node)| node.name == "Sign")
            .unwrap();
        assert!(sign.cast_shadow && sign.receive_shadow);
        assert_eq!(sign.material().unwrap().name, "billboard");
    }

    #[test]
    fn test_disabled_assets_request_nothing() {
        let mut config = test_config(missing_root());
        config.assets.load_external = false;
        let mut context = park(&config);
        context.request_assets();
        assert_eq!(context.assets_in_flight(), 0);
    }

    #[test]
    fn test_tick_spins_moon_and_floats_orbs() {
        let mut context = park(&test_config(missing_root()));
        let lamp = context.lamps[0];
        let start = context.scene.get(context.moon).unwrap().transform.rotation;

        let quarter = lamp.animation.period_ms() / 4.0;
        context.tick(quarter);

        let moon = context.scene.get(context.moon).unwrap();
        assert_ne!(moon.transform.rotation, start);
        let orb_y = context.scene.get(lamp.orb).unwrap().transform.position.y;
        assert!((orb_y - (lamp.animation.base_y + lamp.animation.amplitude)).abs() < 1e-4);
    }

    #[test]
    fn test_camera_damping_glides_then_settles() {
        let mut context = park(&test_config(missing_root()));
        let start = context.camera.camera.eye;

        context.camera.camera.add_yaw(1.0);
        context.tick(0.0);
        let first = context.camera.camera.eye;
        let first_step = (first - start).magnitude();
        assert!(first_step > 0.0);

        for _ in 0..1000 {
            context.tick(0.0);
        }
        assert!(context.camera.camera.is_settled());
        // total turn is the queued yaw
        let turned = context.camera.camera.yaw - OrbitCamera::looking_at(start, Vector3::new(0.0, 0.0, 0.0), 1.0).yaw;
        assert!((turned - 1.0).abs() < 1e-3);
    }
}

//! WGPU-based rendering engine for the park
//!
//! Draws a [`Scene`] from an [`OrbitCamera`] in three steps: depth-only shadow passes
//! from the sun and the spot light, then one main pass with the skybox, opaque surfaces and finally
//! transparent surfaces sorted back to front. GPU resources for meshes, textures and
//! the skybox are created the first time they are needed.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    config::RenderConfig,
    gfx::{
        camera::OrbitCamera,
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform, ShadowCasters},
            material::Shading,
            texture_resource::{CubeMapData, TextureResource},
        },
        scene::{Scene, ShadowSettings},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

use super::{
    draw_list::{DrawItem, DrawList, PipelineKey},
    gpu_objects::{DrawMesh, ObjectCache},
    pipeline_manager::{PipelineConfig, PipelineManager},
};

const PARK_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/park.wgsl")
);
const SHADOW_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/shadow.wgsl")
);
const SKYBOX_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/skybox.wgsl")
);

const SHADOW_PIPELINE: &str = "Shadow";
const SPOT_SHADOW_PIPELINE: &str = "Spot Shadow";
const SKYBOX_PIPELINE: &str = "Skybox";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create the window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open the graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("the surface reports no supported texture formats")]
    NoSurfaceFormat,
}

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles all low-level graphics operations including:
/// - Surface and device management
/// - Pipeline creation for every material variant
/// - Depth buffer handling and the sun and spot shadow maps
/// - Lazy uploads of meshes, textures and the skybox
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    objects: ObjectCache,
    exposure: f32,

    shadow_layout: BindGroupLayoutWithDesc,
    sun_shadow: ShadowTarget,
    spot_shadow: ShadowTarget,
    shadow_bind_group: wgpu::BindGroup,

    sky_layout: BindGroupLayoutWithDesc,
    sky_bind_group: wgpu::BindGroup,
    sky_source: Option<Arc<CubeMapData>>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu, configures an sRGB surface with vsync, creates the depth
    /// buffer and registers the shadow, skybox and material pipelines.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `render_config` - Exposure used for tone mapping
    ///
    /// # Errors
    /// Fails when no surface, adapter or device can be created
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        render_config: &RenderConfig,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let objects = ObjectCache::new(&device, &queue);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .next_binding_fragment(binding_types::depth_texture_2d())
            .create(&device, "Shadow Bind Group Layout");
        // Placeholders until a shadowed light shows up; never sampled while unused
        let sun_shadow = ShadowTarget::placeholder(&device);
        let spot_shadow = ShadowTarget::placeholder(&device);
        let shadow_bind_group =
            create_shadow_bind_group(&device, &shadow_layout, &sun_shadow, &spot_shadow);

        let sky_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Skybox Bind Group Layout");
        let black_sky = TextureResource::create_black_cube_map(&device, &queue);
        let sky_bind_group = create_sky_bind_group(&device, &sky_layout, &black_sky);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("park", PARK_SHADER);
        pipeline_manager.load_shader("shadow", SHADOW_SHADER);
        pipeline_manager.load_shader("skybox", SKYBOX_SHADER);

        let global_layout = global_bindings.bind_group_layout().clone();
        let object_layout = objects.bind_group_layout().clone();

        // Both faces go into the shadow maps so thin models still cast
        for (name, vertex_entry) in [(SHADOW_PIPELINE, "vs_main"), (SPOT_SHADOW_PIPELINE, "vs_spot")] {
            pipeline_manager.register_pipeline(
                name,
                PipelineConfig::default()
                    .with_label(name)
                    .with_shader("shadow")
                    .with_vertex_entry(vertex_entry)
                    .with_vertex_only()
                    .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                    .with_depth_bias(wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 2.0,
                        clamp: 0.0,
                    })
                    .with_cull_mode(None)
                    .with_bind_group_layouts(vec![global_layout.clone(), object_layout.clone()])
                    .with_color_targets(vec![]),
            );
        }

        pipeline_manager.register_pipeline(
            SKYBOX_PIPELINE,
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader("skybox")
                .with_no_vertex_buffers()
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_test(false, wgpu::CompareFunction::LessEqual)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![global_layout.clone(), sky_layout.layout.clone()])
                .with_color_targets(vec![Some(color_target(format, false))]),
        );

        for key in PipelineKey::all() {
            let fragment_entry = match key.shading {
                Shading::Lit => "fs_main",
                Shading::Unlit => "fs_unlit",
            };
            pipeline_manager.register_pipeline(
                &key.name(),
                PipelineConfig::default()
                    .with_label(&key.name())
                    .with_shader("park")
                    .with_fragment_entry(fragment_entry)
                    .with_cull_mode(key.cull_mode())
                    .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                    .with_depth_test(!key.transparent, wgpu::CompareFunction::Less)
                    .with_bind_group_layouts(vec![
                        global_layout.clone(),
                        object_layout.clone(),
                        shadow_layout.layout.clone(),
                    ])
                    .with_color_targets(vec![Some(color_target(format, key.transparent))]),
            );
        }

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{error}");
            }
        }
        log::debug!("{:?}", pipeline_manager.get_stats());

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            objects,
            exposure: render_config.exposure,
            shadow_layout,
            sun_shadow,
            spot_shadow,
            shadow_bind_group,
            sky_layout,
            sky_bind_group,
            sky_source: None,
        })
    }

    /// Renders one frame and returns the number of draw calls issued
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped. Other surface
    /// errors are returned for the caller to decide on.
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        camera: &OrbitCamera,
    ) -> Result<u32, wgpu::SurfaceError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let lights = scene.lights();
        let shadows = ShadowCasters::from_lights(&lights);
        self.global_ubo.update_content(
            &self.queue,
            GlobalUniform::new(camera, &lights, self.exposure),
        );
        self.ensure_shadow_maps(&shadows);
        self.ensure_sky(scene);

        let draw_list = DrawList::build(scene, camera.eye, camera.up);
        self.objects.prepare(
            &self.device,
            &self.queue,
            scene,
            draw_list.opaque.iter().chain(draw_list.transparent.iter()),
        );

        let Some(global_bind_group) = self.global_bindings.bind_group() else {
            return Ok(0);
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let mut draw_calls = 0;

        // PASS 1: shadow depth from each shadowed light
        let shadow_passes = [
            (shadows.sun, &self.sun_shadow, SHADOW_PIPELINE),
            (shadows.spot, &self.spot_shadow, SPOT_SHADOW_PIPELINE),
        ];
        for (settings, target, pipeline_name) in shadow_passes {
            if settings.is_none() {
                continue;
            }
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pipeline_name),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(pipeline_name) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, global_bind_group, &[]);
                for item in &draw_list.shadow_casters {
                    draw_calls += self.draw_item(&mut shadow_pass, scene, item);
                }
            }
        }

        // PASS 2: skybox, opaque, then transparent surfaces
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, global_bind_group, &[]);

            if self.sky_source.is_some() {
                if let Some(pipeline) = self.pipeline_manager.pipeline(SKYBOX_PIPELINE) {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(1, &self.sky_bind_group, &[]);
                    render_pass.draw(0..3, 0..1);
                    draw_calls += 1;
                }
            }

            render_pass.set_bind_group(2, &self.shadow_bind_group, &[]);

            let mut current: Option<PipelineKey> = None;
            for item in draw_list.opaque.iter().chain(draw_list.transparent.iter()) {
                if current != Some(item.pipeline) {
                    let Some(pipeline) = self.pipeline_manager.pipeline(&item.pipeline.name())
                    else {
                        continue;
                    };
                    render_pass.set_pipeline(pipeline);
                    current = Some(item.pipeline);
                }
                draw_calls += self.draw_item(&mut render_pass, scene, item);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(draw_calls)
    }

    fn draw_item(&self, pass: &mut wgpu::RenderPass<'_>, scene: &Scene, item: &DrawItem) -> u32 {
        let (Some(bind_group), Some(mesh)) = (
            self.objects.bind_group(item.node),
            self.objects.mesh(scene, item),
        ) else {
            return 0;
        };
        pass.set_bind_group(1, bind_group, &[]);
        pass.draw_mesh(mesh);
        1
    }

    fn ensure_shadow_maps(&mut self, shadows: &ShadowCasters) {
        let max_size = self.device.limits().max_texture_dimension_2d;
        let mut recreated = false;
        if let Some(settings) = &shadows.sun {
            recreated |= self.sun_shadow.ensure(&self.device, settings, max_size);
        }
        if let Some(settings) = &shadows.spot {
            recreated |= self.spot_shadow.ensure(&self.device, settings, max_size);
        }
        if recreated {
            self.shadow_bind_group = create_shadow_bind_group(
                &self.device,
                &self.shadow_layout,
                &self.sun_shadow,
                &self.spot_shadow,
            );
        }
    }

    fn ensure_sky(&mut self, scene: &Scene) {
        let Some(background) = scene.background() else {
            return;
        };
        if self
            .sky_source
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, background))
        {
            return;
        }
        log::info!(
            "Uploading skybox ({}x{} faces)",
            background.face_size,
            background.face_size
        );
        let cube = TextureResource::create_cube_map(&self.device, &self.queue, background, "Skybox");
        self.sky_bind_group = create_sky_bind_group(&self.device, &self.sky_layout, &cube);
        self.sky_source = Some(background.clone());
    }

    /// Resizes the rendering surface and associated resources
    ///
    /// Zero sizes (minimized windows) are ignored. Recreates the depth texture to
    /// match the new dimensions; the shadow maps keep their resolution.
    ///
    /// # Arguments
    /// * `width` - New surface width in pixels
    /// * `height` - New surface height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Returns current surface dimensions
    ///
    /// # Returns
    /// Tuple of (width, height) in pixels
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Returns reference to the wgpu device
    ///
    /// Used for creating GPU resources like buffers and textures.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns reference to the wgpu command queue
    ///
    /// Used for submitting GPU commands and updating buffers.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn color_target(format: TextureFormat, transparent: bool) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format,
        blend: Some(if transparent {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        }),
        write_mask: wgpu::ColorWrites::ALL,
    }
}

/// Depth target of one shadow-casting light
struct ShadowTarget {
    map: TextureResource,
    size: u32,
}

impl ShadowTarget {
    fn placeholder(device: &wgpu::Device) -> Self {
        Self {
            map: TextureResource::create_shadow_map(device, 1),
            size: 1,
        }
    }

    /// Recreates the map when the requested resolution changed; returns true if it did
    fn ensure(&mut self, device: &wgpu::Device, settings: &ShadowSettings, max_size: u32) -> bool {
        let size = settings.map_size.clamp(1, max_size);
        if size == self.size {
            return false;
        }
        log::debug!("Creating {size}x{size} shadow map");
        self.map = TextureResource::create_shadow_map(device, size);
        self.size = size;
        true
    }
}

fn create_shadow_bind_group(
    device: &wgpu::Device,
    layout: &BindGroupLayoutWithDesc,
    sun: &ShadowTarget,
    spot: &ShadowTarget,
) -> wgpu::BindGroup {
    // Both maps share the sun's comparison sampler
    BindGroupBuilder::new(layout)
        .texture(&sun.map.view)
        .sampler(&sun.map.sampler)
        .texture(&spot.map.view)
        .create(device, "Shadow Bind Group")
}

fn create_sky_bind_group(
    device: &wgpu::Device,
    layout: &BindGroupLayoutWithDesc,
    cube: &TextureResource,
) -> wgpu::BindGroup {
    BindGroupBuilder::new(layout)
        .texture(&cube.view)
        .sampler(&cube.sampler)
        .create(device, "Skybox Bind Group")
}

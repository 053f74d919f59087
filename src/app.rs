use anyhow::Context;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::ParkConfig,
    gfx::RenderEngine,
    park::{ParkContext, Viewport},
    performance::FrameTimer,
};

pub struct PastelParkApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ParkConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    park: ParkContext,
    frame_timer: FrameTimer,
    /// Set when startup fails inside the event loop; returned from `run`
    fatal: Option<anyhow::Error>,
}

impl PastelParkApp {
    /// Builds the park and starts loading its assets. The window and GPU are created
    /// once the event loop is running.
    pub fn new(config: ParkConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        let mut rng = ParkContext::rng(&config);
        let viewport = Viewport::new(config.window.width, config.window.height);
        let mut park = ParkContext::build(&config, &mut rng, viewport)
            .context("failed to build the park scene")?;
        park.request_assets();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                park,
                frame_timer: FrameTimer::new(),
                fatal: None,
            },
        })
    }

    /// Run the application (consumes self and blocks until the window closes)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")?;

        match self.app_state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

impl AppState {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_config = &self.config.window;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
            )
            .context("failed to create window")?;
        let window_handle = Arc::new(window);

        let (width, height) = window_handle.inner_size().into();
        let window_clone = window_handle.clone();
        let render_config = self.config.render.clone();
        let renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, &render_config).await
        })?;

        self.park.resize(width, height);
        self.render_engine = Some(renderer);
        self.window = Some(window_handle);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        self.frame_timer.begin_frame();
        self.park.tick(now_ms());

        match render_engine.render_frame(&self.park.scene, &self.park.camera.camera) {
            Ok(draw_calls) => self.frame_timer.set_draw_calls(draw_calls),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Skipped frame: {err}"),
        }
        self.frame_timer.end_frame();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.create_window(event_loop) {
            log::error!("{err:#}");
            self.fatal = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.park.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                self.park.resize(width, height);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        self.park.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let stats = self.frame_timer.stats();
        log::info!(
            "Exiting after {:.1} fps average, {} assets still loading",
            stats.fps,
            self.park.assets_in_flight()
        );
    }
}

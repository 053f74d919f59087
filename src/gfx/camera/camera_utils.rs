use cgmath::{Matrix4, SquareMatrix};
use winit::event::{DeviceEvent, WindowEvent};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Feeds raw mouse motion to the controller
    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        self.controller.process_device_event(event, &mut self.camera);
    }

    /// Feeds button and wheel input to the controller. Returns true when consumed.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        self.controller.process_window_event(event, &mut self.camera)
    }

    /// Advances damping one step
    pub fn update(&mut self) {
        self.camera.update();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize_projection(width, height);
        self.controller.set_viewport_height(height);
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;

    /// Maps clip space back to world space; identity if the matrix is singular
    fn build_inverse_view_projection_matrix(&self) -> Matrix4<f32> {
        self.build_view_projection_matrix()
            .invert()
            .unwrap_or_else(Matrix4::identity)
    }
}

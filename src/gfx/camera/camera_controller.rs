use cgmath::Vector2;
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use super::orbit_camera::OrbitCamera;

/// Wheel notches are converted to this many pixels when the platform reports lines
const PIXELS_PER_LINE: f32 = 100.0;

/// Translates mouse input into orbit camera requests.
///
/// Left drag rotates, right drag pans, the wheel zooms. A full viewport height of
/// drag rotates by one full turn.
pub struct CameraController {
    pub zoom_speed: f32,
    pub pan_speed: f32,
    viewport_height: f32,
    is_rotating: bool,
    is_panning: bool,
}

impl CameraController {
    pub fn new(zoom_speed: f32, viewport_height: u32) -> Self {
        Self {
            zoom_speed,
            pan_speed: 1.0,
            viewport_height: viewport_height.max(1) as f32,
            is_rotating: false,
            is_panning: false,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    pub fn process_window_event(&mut self, event: &WindowEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.is_rotating = pressed,
                    MouseButton::Right => self.is_panning = pressed,
                    _ => return false,
                }
                // Clicks are still needed for picking
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, lines) => *lines * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
                };
                self.process_scroll(scroll, camera);
                true
            }
            WindowEvent::Focused(false) => {
                self.is_rotating = false;
                self.is_panning = false;
                false
            }
            _ => false,
        }
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.process_mouse_motion((delta.0 as f32, delta.1 as f32), camera);
        }
    }

    /// Applies a drag of `delta` pixels according to the held buttons
    pub fn process_mouse_motion(&mut self, delta: (f32, f32), camera: &mut OrbitCamera) {
        if self.is_rotating {
            let radians_per_pixel = 2.0 * std::f32::consts::PI / self.viewport_height;
            camera.add_yaw(-delta.0 * radians_per_pixel);
            camera.add_pitch(delta.1 * radians_per_pixel);
        } else if self.is_panning {
            // Pixels to world units at the target distance
            let half_height = camera.distance * (camera.fovy.0 * 0.5).tan();
            let units_per_pixel = 2.0 * half_height / self.viewport_height * self.pan_speed;
            camera.add_pan(Vector2::new(
                -delta.0 * units_per_pixel,
                delta.1 * units_per_pixel,
            ));
        }
    }

    /// Positive scroll (wheel up) moves closer
    pub fn process_scroll(&mut self, scroll_pixels: f32, camera: &mut OrbitCamera) {
        if scroll_pixels != 0.0 {
            camera.zoom(0.95_f32.powf(scroll_pixels / PIXELS_PER_LINE * self.zoom_speed));
        }
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_panning
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_rotating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Zero};

    fn camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vector3::new(-9.0, 3.0, 2.0), Vector3::zero(), 4.0 / 3.0)
    }

    #[test]
    fn test_motion_without_buttons_is_ignored() {
        let mut camera = camera();
        let mut controller = CameraController::new(1.0, 600);
        controller.process_mouse_motion((50.0, 20.0), &mut camera);
        for _ in 0..10 {
            camera.update();
        }
        assert!(camera.is_settled());
        assert!((camera.eye - Vector3::new(-9.0, 3.0, 2.0)).magnitude() < 1e-4);
    }

    #[test]
    fn test_left_drag_rotates_gradually() {
        let mut camera = camera();
        let mut controller = CameraController::new(1.0, 600);
        controller.is_rotating = true;
        controller.process_mouse_motion((60.0, 0.0), &mut camera);

        let start_yaw = camera.yaw;
        camera.update();
        let first_step = camera.yaw - start_yaw;
        let total = -60.0 * 2.0 * std::f32::consts::PI / 600.0;
        assert!((first_step - total * 0.03).abs() < 1e-5);
    }

    #[test]
    fn test_scroll_up_zooms_in() {
        let mut camera = camera();
        let mut controller = CameraController::new(1.0, 600);
        let start = camera.distance;
        controller.process_scroll(100.0, &mut camera);
        assert!((camera.distance - start * 0.95).abs() < 1e-4);
    }
}

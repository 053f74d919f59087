use super::camera_utils::Camera;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Fraction of the pending rotation and pan applied per update
pub const DEFAULT_DAMPING: f32 = 0.03;

const SETTLED: f32 = 1e-6;

/// Y-up camera orbiting a target point.
///
/// Rotation and pan requests accumulate in pending deltas that [`OrbitCamera::update`]
/// eases in: each update applies `pending * damping` and keeps the rest, so the camera
/// glides to a stop after input ends.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub damping: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_pan: Vector2<f32>,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.build_projection_matrix() * self.build_view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculated in `update_eye()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Deg(75.0).into(),
            znear: 0.1,
            zfar: 1000.0,
            damping: DEFAULT_DAMPING,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_pan: Vector2::zero(),
        };
        camera.update_eye();
        camera
    }

    /// Places the camera at `eye`, orbiting `target`
    pub fn looking_at(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude().max(f32::EPSILON);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self::new(distance, pitch, yaw, target, aspect)
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update_eye();
    }

    /// Multiplies the orbit distance; values below 1 move closer. Applied immediately.
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.set_distance(self.distance * factor);
        }
    }

    /// Queues a yaw change, eased in by `update`
    pub fn add_yaw(&mut self, delta: f32) {
        self.pending_yaw += delta;
    }

    /// Queues a pitch change, eased in by `update`
    pub fn add_pitch(&mut self, delta: f32) {
        self.pending_pitch += delta;
    }

    /// Queues a pan in view space: x moves along the camera right axis, y along its up axis
    pub fn add_pan(&mut self, delta: Vector2<f32>) {
        self.pending_pan += delta;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_yaw.abs() < SETTLED
            && self.pending_pitch.abs() < SETTLED
            && self.pending_pan.magnitude() < SETTLED
    }

    /// Applies one damping step of the pending rotation and pan
    pub fn update(&mut self) {
        if self.is_settled() {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
            self.pending_pan = Vector2::zero();
            return;
        }

        let keep = 1.0 - self.damping;

        self.yaw += self.pending_yaw * self.damping;
        self.pending_yaw *= keep;

        self.pitch = (self.pitch + self.pending_pitch * self.damping)
            .clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.pending_pitch *= keep;

        let step = self.pending_pan * self.damping;
        self.pending_pan *= keep;
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();
        self.target += right * step.x + up * step.y;

        self.update_eye();
    }

    /// Recomputes the eye after changing `distance`, `pitch`, `yaw` or `target`.
    fn update_eye(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    /// Updates the aspect ratio only; the eye and target stay where they are
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn build_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    pub fn build_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_pitch: -std::f32::consts::FRAC_PI_2 + 1e-3,
            max_pitch: std::f32::consts::FRAC_PI_2 - 1e-3,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn park_camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vector3::new(-9.0, 3.0, 2.0), Vector3::zero(), 800.0 / 600.0)
    }

    #[test]
    fn test_looking_at_reproduces_eye() {
        let camera = park_camera();
        assert!((camera.eye - Vector3::new(-9.0, 3.0, 2.0)).magnitude() < 1e-4);
        assert!((camera.distance - 94.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_damping_applies_fraction_per_update() {
        let mut camera = park_camera();
        let start_yaw = camera.yaw;
        camera.add_yaw(1.0);

        camera.update();
        assert!((camera.yaw - start_yaw - DEFAULT_DAMPING).abs() < 1e-6);

        camera.update();
        let expected = DEFAULT_DAMPING + DEFAULT_DAMPING * (1.0 - DEFAULT_DAMPING);
        assert!((camera.yaw - start_yaw - expected).abs() < 1e-5);
    }

    #[test]
    fn test_damping_converges() {
        let mut camera = park_camera();
        let start_yaw = camera.yaw;
        let start_distance = camera.distance;
        camera.add_yaw(0.5);

        for _ in 0..1000 {
            camera.update();
        }

        assert!((camera.yaw - start_yaw - 0.5).abs() < 1e-3);
        assert!(camera.is_settled());
        assert!((camera.distance - start_distance).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_stays_bounded() {
        let mut camera = park_camera();
        camera.add_pitch(100.0);
        for _ in 0..500 {
            camera.update();
        }
        assert!(camera.pitch <= camera.bounds.max_pitch);
        assert!(camera.eye.y < camera.distance + 1e-3);
    }

    #[test]
    fn test_pan_moves_target_and_eye_together() {
        let mut camera = park_camera();
        let offset = camera.eye - camera.target;
        camera.add_pan(Vector2::new(1.0, 0.0));
        for _ in 0..1000 {
            camera.update();
        }

        assert!(camera.target.magnitude() > 0.99);
        assert!((camera.eye - camera.target - offset).magnitude() < 1e-3);
    }

    #[test]
    fn test_zoom_is_immediate() {
        let mut camera = park_camera();
        let start = camera.distance;
        camera.zoom(0.5);
        assert!((camera.distance - start * 0.5).abs() < 1e-5);
        camera.zoom(-1.0);
        assert!((camera.distance - start * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_resize_changes_aspect_only() {
        let mut camera = park_camera();
        let eye = camera.eye;
        camera.resize_projection(1920, 1080);

        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(camera.eye, eye);

        camera.resize_projection(0, 0);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}

use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

/// A camera controller that orbits around a target point.
///
/// Used by the single-plane controls page: dragging with the left button
/// rotates around the plane, the wheel dollies in and out.
///
/// # Example
/// ```ignore
/// let mut orbit = OrbitCamera::new().distance(4.0).far(30.0);
///
/// // In frame loop:
/// orbit.update(&input);
/// let camera = orbit.camera();
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians (yaw).
    pub azimuth: f32,
    /// Vertical angle in radians (pitch), clamped short of the poles.
    pub elevation: f32,
    /// Field of view in radians.
    pub fov: f32,
    pub far: f32,
    /// Mouse sensitivity.
    pub sensitivity: f32,
    /// Scroll zoom sensitivity.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 4.0,
            azimuth: 0.0,
            elevation: 0.0,
            fov: 70f32.to_radians(),
            far: 30.0,
            sensitivity: 0.005,
            zoom_sensitivity: 0.5,
            min_distance: 0.5,
            max_distance: 25.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the orbit from a fixed camera, keeping its position and lens.
    pub fn from_camera(camera: &Camera) -> Self {
        let offset = camera.position;
        let distance = offset.length().max(0.5);
        Self {
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            fov: camera.fov,
            far: camera.far,
            ..Self::default()
        }
    }

    /// Set the target point to orbit around.
    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the distance from target.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn far(mut self, far: f32) -> Self {
        self.far = far;
        self
    }

    /// Set distance limits.
    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.distance = self.distance.clamp(min, max);
        self
    }

    /// Update the orbit from mouse drag and wheel input.
    pub fn update(&mut self, input: &Input) {
        if input.mouse_down(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.azimuth -= delta.x * self.sensitivity;
            self.elevation =
                (self.elevation + delta.y * self.sensitivity).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }

        let scroll = input.scroll_delta();
        if scroll.y.abs() > 0.0 {
            self.distance = (self.distance - scroll.y * self.zoom_sensitivity)
                .clamp(self.min_distance, self.max_distance);
        }
    }

    /// Get the current camera state.
    pub fn camera(&self) -> Camera {
        // Spherical to Cartesian conversion
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );

        let position = self.target + offset;

        Camera {
            position,
            forward: (self.target - position).normalize_or(Vec3::NEG_Z),
            up: Vec3::Y,
            fov: self.fov,
            near: 0.1,
            far: self.far,
        }
    }
}

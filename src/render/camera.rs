//! Perspective camera.

use glam::{Mat4, Quat, Vec3};

/// A perspective camera described by a world position and an orientation.
///
/// The rotation is the view rotation: it maps world directions into camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y_degrees: 60.0,
            near: 1.0,
            far: 200.0,
        }
    }
}

impl Camera {
    /// Place the camera at `position` looking at `target` with +Y up.
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            ..Self::default()
        };
        camera.set_target(target);
        camera
    }

    /// Re-aim the camera at `target` without moving it.
    pub fn set_target(&mut self, target: Vec3) {
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        self.rotation = Quat::from_mat4(&view).normalize();
    }

    pub fn with_perspective(mut self, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        self.fov_y_degrees = fov_y_degrees;
        self.near = near;
        self.far = far;
        self
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation) * Mat4::from_translation(-self.position)
    }

    /// Camera-to-clip matrix for the given aspect ratio (width / height).
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect.max(f32::EPSILON),
            self.near,
            self.far,
        )
    }

    /// Direction the camera looks along, in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation.inverse() * Vec3::NEG_Z
    }
}

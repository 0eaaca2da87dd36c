//! Rigid body state and integration.

use glam::{Mat3, Mat4, Quat, Vec3};

/// Fraction of velocity kept after one second (applied as `damping^dt`).
const DEFAULT_DAMPING: f32 = 0.99;

/// Physical state of a simulated object.
///
/// A body with zero inverse mass has infinite mass: integration and contact resolution
/// leave its position and orientation untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Centre of mass in world space.
    pub position: Vec3,
    /// Unit orientation quaternion.
    pub orientation: Quat,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Constant acceleration applied every step (e.g. gravity).
    pub acceleration: Vec3,
    /// Angular velocity in world space.
    pub angular_velocity: Vec3,
    /// Fraction of linear velocity kept per second.
    pub linear_damping: f32,
    /// Fraction of angular velocity kept per second.
    pub angular_damping: f32,
    inverse_mass: f32,
    /// Body-space inverse inertia tensor.
    inverse_inertia: Mat3,
    force_accumulator: Vec3,
    torque_accumulator: Vec3,
    // Derived data
    transform: Mat4,
    inverse_inertia_world: Mat3,
}

impl RigidBody {
    /// Create a unit-mass body at `position` with no rotational inertia set.
    ///
    /// Until [`set_inertia_tensor`](Self::set_inertia_tensor) is called the body does not
    /// respond to torques or off-centre impulses.
    pub fn new(position: Vec3) -> Self {
        let mut body = Self {
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: DEFAULT_DAMPING,
            angular_damping: DEFAULT_DAMPING,
            inverse_mass: 1.0,
            inverse_inertia: Mat3::ZERO,
            force_accumulator: Vec3::ZERO,
            torque_accumulator: Vec3::ZERO,
            transform: Mat4::IDENTITY,
            inverse_inertia_world: Mat3::ZERO,
        };
        body.calculate_derived_data();
        body
    }

    /// Create an immovable body at `position`.
    pub fn new_static(position: Vec3) -> Self {
        let mut body = Self::new(position);
        body.set_infinite_mass();
        body
    }

    /// Set a finite mass. Non-positive or non-finite values make the body immovable.
    pub fn set_mass(&mut self, mass: f32) {
        if mass > 0.0 && mass.is_finite() {
            self.inverse_mass = 1.0 / mass;
        } else {
            self.set_infinite_mass();
        }
    }

    /// Make the body immovable.
    pub fn set_infinite_mass(&mut self) {
        self.inverse_mass = 0.0;
    }

    /// Mass of the body, `f32::INFINITY` when immovable.
    pub fn mass(&self) -> f32 {
        if self.inverse_mass == 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Set the body-space inertia tensor. A singular tensor disables rotation.
    pub fn set_inertia_tensor(&mut self, inertia: Mat3) {
        self.inverse_inertia = if inertia.determinant().abs() > f32::EPSILON {
            inertia.inverse()
        } else {
            Mat3::ZERO
        };
        self.calculate_derived_data();
    }

    /// Body-space inverse inertia tensor.
    pub fn inverse_inertia(&self) -> Mat3 {
        self.inverse_inertia
    }

    /// World-space inverse inertia tensor, as of the last derived-data refresh.
    pub fn inverse_inertia_world(&self) -> Mat3 {
        self.inverse_inertia_world
    }

    /// Body-to-world transform, as of the last derived-data refresh.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Accumulate a force through the centre of mass for the next step.
    pub fn add_force(&mut self, force: Vec3) {
        self.force_accumulator += force;
    }

    /// Accumulate a force applied at a world-space point.
    pub fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        self.force_accumulator += force;
        self.torque_accumulator += (point - self.position).cross(force);
    }

    /// Accumulate a torque for the next step.
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque_accumulator += torque;
    }

    /// Recompute the transform and world inertia from position and orientation.
    pub fn calculate_derived_data(&mut self) {
        self.orientation = self.orientation.normalize();
        self.transform = Mat4::from_rotation_translation(self.orientation, self.position);

        let rotation = Mat3::from_quat(self.orientation);
        self.inverse_inertia_world = rotation * self.inverse_inertia * rotation.transpose();
    }

    /// Advance the body by `dt` seconds using semi-implicit Euler.
    ///
    /// Velocities are updated first and the new velocities move the body. Accumulators
    /// are cleared and derived data refreshed afterwards.
    pub fn integrate(&mut self, dt: f32) {
        if self.inverse_mass == 0.0 {
            return;
        }

        let linear_acceleration = self.acceleration + self.force_accumulator * self.inverse_mass;
        let angular_acceleration = self.inverse_inertia_world * self.torque_accumulator;

        self.velocity += linear_acceleration * dt;
        self.angular_velocity += angular_acceleration * dt;

        self.velocity *= self.linear_damping.powf(dt);
        self.angular_velocity *= self.angular_damping.powf(dt);

        self.position += self.velocity * dt;

        // q' = q + 0.5 * dt * omega_quat * q
        let omega = self.angular_velocity;
        if omega.length_squared() > 1e-12 {
            let spin = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0) * self.orientation;
            let half_dt = 0.5 * dt;
            self.orientation = Quat::from_xyzw(
                self.orientation.x + spin.x * half_dt,
                self.orientation.y + spin.y * half_dt,
                self.orientation.z + spin.z * half_dt,
                self.orientation.w + spin.w * half_dt,
            );
        }

        self.calculate_derived_data();
        self.force_accumulator = Vec3::ZERO;
        self.torque_accumulator = Vec3::ZERO;
    }
}

/// Inertia tensor of a solid sphere: `0.4 * mass * radius²` on the diagonal.
pub fn sphere_inertia(mass: f32, radius: f32) -> Mat3 {
    Mat3::from_diagonal(Vec3::splat(0.4 * mass * radius * radius))
}

/// Inertia tensor of a solid cuboid with the given half extents.
pub fn cuboid_inertia(mass: f32, half_size: Vec3) -> Mat3 {
    let sq = half_size * half_size;
    Mat3::from_diagonal(Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_fall() {
        let mut body = RigidBody::new(Vec3::new(0.0, 10.0, 0.0));
        body.acceleration = Vec3::new(0.0, -9.81, 0.0);
        let dt = 1.0 / 60.0;

        for _ in 0..60 {
            body.integrate(dt);
        }

        // Analytic: 10 - 0.5 * 9.81 ≈ 5.1; semi-implicit Euler lands slightly lower.
        assert!(
            body.position.y < 5.2 && body.position.y > 4.8,
            "unexpected height after 1s: y = {}",
            body.position.y
        );
        assert!(body.position.x.abs() < 1e-6);
        assert!(body.position.z.abs() < 1e-6);
    }

    #[test]
    fn test_static_body_bit_identical() {
        let mut body = RigidBody::new_static(Vec3::new(0.0, 2.0, -10.0));
        body.orientation = Quat::from_rotation_y(0.3);
        body.velocity = Vec3::new(1.0, 2.0, 3.0);
        body.acceleration = Vec3::new(0.0, -9.81, 0.0);
        body.angular_velocity = Vec3::new(0.5, 0.0, 0.0);
        body.add_force(Vec3::splat(100.0));
        let position = body.position;
        let orientation = body.orientation;

        for _ in 0..120 {
            body.integrate(1.0 / 60.0);
        }

        assert_eq!(body.position.to_array(), position.to_array());
        assert_eq!(body.orientation.to_array(), orientation.to_array());
        assert_eq!(body.mass(), f32::INFINITY);
    }

    #[test]
    fn test_set_mass_rejects_non_positive() {
        let mut body = RigidBody::new(Vec3::ZERO);
        body.set_mass(8.0);
        assert!((body.inverse_mass() - 0.125).abs() < 1e-6);
        body.set_mass(0.0);
        assert!(!body.has_finite_mass());
    }

    #[test]
    fn test_spin_rotates_orientation() {
        let mut body = RigidBody::new(Vec3::ZERO);
        body.set_inertia_tensor(sphere_inertia(1.0, 1.0));
        body.angular_velocity = Vec3::new(0.0, std::f32::consts::PI, 0.0);
        body.angular_damping = 1.0;

        // Half a second at pi rad/s is a quarter turn about Y.
        for _ in 0..500 {
            body.integrate(0.001);
        }

        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(
            body.orientation.dot(expected).abs() > 0.999,
            "orientation drifted: {:?}",
            body.orientation
        );
        assert!((body.orientation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_derived_transform_follows_pose() {
        let mut body = RigidBody::new(Vec3::ZERO);
        body.position = Vec3::new(1.0, 2.0, 3.0);
        body.orientation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        body.calculate_derived_data();

        let p = body.transform().transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 3.0, 3.0)).length() < 1e-5, "p = {:?}", p);
    }

    #[test]
    fn test_world_inertia_rotates_with_body() {
        let mut body = RigidBody::new(Vec3::ZERO);
        body.set_inertia_tensor(Mat3::from_diagonal(Vec3::new(1.0, 2.0, 4.0)));
        body.orientation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        body.calculate_derived_data();

        // Body X now points along world Y, so world Y sees the body-X inertia.
        let world = body.inverse_inertia_world() * Vec3::Y;
        assert!((world - Vec3::Y).length() < 1e-5, "world = {:?}", world);
    }

    #[test]
    fn test_inertia_helpers() {
        let sphere = sphere_inertia(1.5, 0.2);
        assert!((sphere.x_axis.x - 0.024).abs() < 1e-6);
        assert_eq!(sphere.x_axis.x, sphere.z_axis.z);

        let cube = cuboid_inertia(8.0, Vec3::ONE);
        assert!((cube.y_axis.y - 16.0 / 3.0).abs() < 1e-5);
    }
}

//! Collision shapes and their world-space placement.

use glam::{Mat4, Vec3};

use super::rigid_body::RigidBody;

/// Geometry used by the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// One-sided plane: anything with `normal · p < offset` is penetrating.
    /// Infinite and never attached to a body.
    Plane { normal: Vec3, offset: f32 },
    /// Oriented box given by its half extents.
    Box { half_size: Vec3 },
    Sphere { radius: f32 },
}

/// A shape placed in the world, optionally driven by a rigid body.
///
/// The collider caches the owning body's transform. It is only correct after
/// [`calculate_derived_data`](Self::calculate_derived_data) has run for the current
/// body pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    body: Option<hecs::Entity>,
    transform: Mat4,
}

impl Collider {
    /// Create a collider for the body stored on `body`.
    pub fn new(shape: ColliderShape, body: hecs::Entity) -> Self {
        Self {
            shape,
            body: Some(body),
            transform: Mat4::IDENTITY,
        }
    }

    /// Create a static half-space. The normal is normalized.
    pub fn plane(normal: Vec3, offset: f32) -> Self {
        Self {
            shape: ColliderShape::Plane {
                normal: normal.normalize_or(Vec3::Y),
                offset,
            },
            body: None,
            transform: Mat4::IDENTITY,
        }
    }

    /// Entity owning the rigid body, `None` for planes.
    #[inline]
    pub fn body(&self) -> Option<hecs::Entity> {
        self.body
    }

    /// Cached world transform.
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// World-space centre.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// World-space direction of local axis `index` (0 = X, 1 = Y, 2 = Z).
    #[inline]
    pub fn axis(&self, index: usize) -> Vec3 {
        self.transform.col(index).truncate()
    }

    /// Refresh the cached transform from the owning body.
    pub fn calculate_derived_data(&mut self, body: Option<&RigidBody>) {
        if let Some(body) = body {
            let rotation = body.orientation.normalize();
            self.transform = Mat4::from_rotation_translation(rotation, body.position);
        }
    }

    /// Farthest point of the shape along `direction`, in world space.
    pub fn support(&self, direction: Vec3) -> Vec3 {
        match self.shape {
            ColliderShape::Sphere { radius } => {
                self.position() + direction.normalize_or_zero() * radius
            }
            ColliderShape::Box { half_size } => {
                let local = self.transform.inverse().transform_vector3(direction);
                let corner = Vec3::new(
                    if local.x >= 0.0 { half_size.x } else { -half_size.x },
                    if local.y >= 0.0 { half_size.y } else { -half_size.y },
                    if local.z >= 0.0 { half_size.z } else { -half_size.z },
                );
                self.transform.transform_point3(corner)
            }
            // Unbounded in every direction except against its normal.
            ColliderShape::Plane { normal, offset } => normal * offset,
        }
    }

    /// The eight world-space corners of a box, `None` for other shapes.
    pub fn box_vertices(&self) -> Option<[Vec3; 8]> {
        let ColliderShape::Box { half_size } = self.shape else {
            return None;
        };
        let mut vertices = [Vec3::ZERO; 8];
        for (i, vertex) in vertices.iter_mut().enumerate() {
            let sign = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            *vertex = self.transform.transform_point3(half_size * sign);
        }
        Some(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn entity() -> hecs::Entity {
        let mut world = hecs::World::new();
        world.spawn(())
    }

    #[test]
    fn test_plane_normal_is_normalized() {
        let plane = Collider::plane(Vec3::new(0.0, 2.0, 0.0), 1.0);
        match plane.shape {
            ColliderShape::Plane { normal, offset } => {
                assert!((normal - Vec3::Y).length() < 1e-6);
                assert_eq!(offset, 1.0);
            }
            _ => panic!("expected a plane"),
        }
        assert!(plane.body().is_none());
    }

    #[test]
    fn test_derived_data_tracks_body() {
        let mut body = RigidBody::new(Vec3::new(0.0, 5.0, 0.0));
        body.orientation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mut collider = Collider::new(
            ColliderShape::Box {
                half_size: Vec3::ONE,
            },
            entity(),
        );

        collider.calculate_derived_data(Some(&body));

        assert!((collider.position() - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-6);
        // Local X rotated a quarter turn about Y points along world -Z.
        assert!((collider.axis(0) - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_box_support_and_vertices() {
        let mut collider = Collider::new(
            ColliderShape::Box {
                half_size: Vec3::new(1.0, 2.0, 3.0),
            },
            entity(),
        );
        collider.calculate_derived_data(Some(&RigidBody::new(Vec3::new(10.0, 0.0, 0.0))));

        let support = collider.support(Vec3::new(1.0, -1.0, 1.0));
        assert!((support - Vec3::new(11.0, -2.0, 3.0)).length() < 1e-5);

        let vertices = collider.box_vertices().expect("box has vertices");
        let lowest = vertices.iter().map(|v| v.y).fold(f32::MAX, f32::min);
        assert_eq!(lowest, -2.0);
    }
}

//! Contact data structures for collision response.

use glam::Vec3;

/// Surface response used for every generated contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    /// Fraction of closing speed kept after impact.
    pub restitution: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.9,
            friction: 0.1,
        }
    }
}

/// A single contact point between two participants.
///
/// `bodies[1]` is `None` when the second participant is a plane or any other immovable
/// geometry without a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub bodies: [Option<hecs::Entity>; 2],
    /// Contact position in world space.
    pub point: Vec3,
    /// Unit normal pointing from the second participant toward the first.
    pub normal: Vec3,
    /// Penetration depth, positive when overlapping.
    pub penetration: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl Contact {
    pub(crate) fn new(
        bodies: [Option<hecs::Entity>; 2],
        point: Vec3,
        normal: Vec3,
        penetration: f32,
        material: ContactMaterial,
    ) -> Self {
        Self {
            bodies,
            point,
            normal,
            penetration,
            restitution: material.restitution,
            friction: material.friction,
        }
    }

    /// Whether this contact involves `entity`.
    pub fn involves(&self, entity: hecs::Entity) -> bool {
        self.bodies.contains(&Some(entity))
    }
}

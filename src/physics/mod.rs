//! CPU rigid-body physics behind a small facade.
//!
//! # Architecture
//!
//! The frame pipeline talks to physics only through [`PhysicsBackend`]:
//!
//! 1. Integrate each body (semi-implicit Euler)
//! 2. Recompute collider derived data from the body pose
//! 3. Narrowphase detection for each candidate pair (specialized tests, SAT)
//! 4. Resolve contacts (position projection, then sequential impulses)
//!
//! There is no broadphase: pair selection is the caller's policy.

pub mod collider;
pub mod contact;
pub mod narrowphase;
pub mod rigid_body;
pub mod solver;

pub use collider::{Collider, ColliderShape};
pub use contact::{Contact, ContactMaterial};
pub use rigid_body::{cuboid_inertia, sphere_inertia, RigidBody};

/// Operations the frame pipeline needs from a physics engine.
///
/// Implementations must leave infinite-mass bodies untouched in every operation.
pub trait PhysicsBackend {
    /// Advance one body by `dt` seconds.
    fn integrate(&mut self, body: &mut RigidBody, dt: f32);

    /// Refresh the collider's cached placement from its body.
    fn recompute_derived_data(&mut self, collider: &mut Collider, body: Option<&RigidBody>);

    /// Append the contacts between `a` and `b` to `contacts`.
    ///
    /// Returns `true` if any contact was generated. Must be deterministic for a fixed
    /// pose: two calls on unchanged state append identical contacts.
    fn detect_collisions(
        &mut self,
        a: &Collider,
        b: &Collider,
        material: ContactMaterial,
        contacts: &mut Vec<Contact>,
    ) -> bool;

    /// Resolve `contacts` with at most `iterations` iterations per phase, writing the
    /// corrected state back into `world`.
    fn resolve_contacts(
        &mut self,
        iterations: usize,
        contacts: &mut [Contact],
        world: &mut hecs::World,
        dt: f32,
    );
}

/// The built-in CPU implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuPhysics;

impl CpuPhysics {
    pub fn new() -> Self {
        Self
    }
}

impl PhysicsBackend for CpuPhysics {
    fn integrate(&mut self, body: &mut RigidBody, dt: f32) {
        body.integrate(dt);
    }

    fn recompute_derived_data(&mut self, collider: &mut Collider, body: Option<&RigidBody>) {
        collider.calculate_derived_data(body);
    }

    fn detect_collisions(
        &mut self,
        a: &Collider,
        b: &Collider,
        material: ContactMaterial,
        contacts: &mut Vec<Contact>,
    ) -> bool {
        narrowphase::detect_collision(a, b, material, contacts)
    }

    fn resolve_contacts(
        &mut self,
        iterations: usize,
        contacts: &mut [Contact],
        world: &mut hecs::World,
        dt: f32,
    ) {
        solver::resolve_contacts(iterations, contacts, world, dt);
    }
}

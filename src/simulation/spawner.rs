//! Projectile spawning.

use glam::{Vec3, Vec4};

use crate::physics::{sphere_inertia, ColliderShape, RigidBody};
use crate::render::{MeshHandle, Renderable, ShaderHandle, Visual};

use super::world::{EntityRole, SimulationWorld};

/// Initial state shared by every projectile a [`Spawner`] fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileTemplate {
    pub radius: f32,
    pub mass: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub visual: Visual,
}

impl ProjectileTemplate {
    /// A heavy round fired down the -Z axis from in front of the camera.
    pub fn new(visual: Visual) -> Self {
        Self {
            radius: 0.2,
            mass: 1.5,
            position: Vec3::new(0.0, 1.5, 20.0),
            velocity: Vec3::new(0.0, 0.0, -40.0),
            acceleration: Vec3::new(0.0, -2.5, 0.0),
            visual,
        }
    }

    pub fn with_visual(shader: ShaderHandle, mesh: MeshHandle) -> Self {
        Self::new(Visual::new(shader, mesh, Vec4::new(0.2, 0.2, 1.0, 1.0)))
    }

    fn body(&self) -> RigidBody {
        let mut body = RigidBody::new(self.position);
        body.set_mass(self.mass);
        body.set_inertia_tensor(sphere_inertia(self.mass, self.radius));
        body.velocity = self.velocity;
        body.acceleration = self.acceleration;
        body
    }
}

/// Creates projectile entities on demand. Projectiles are never removed.
#[derive(Debug, Clone)]
pub struct Spawner {
    template: ProjectileTemplate,
    fired: usize,
}

impl Spawner {
    pub fn new(template: ProjectileTemplate) -> Self {
        Self { template, fired: 0 }
    }

    pub fn template(&self) -> &ProjectileTemplate {
        &self.template
    }

    pub fn template_mut(&mut self) -> &mut ProjectileTemplate {
        &mut self.template
    }

    /// Projectiles fired so far.
    pub fn fired(&self) -> usize {
        self.fired
    }

    /// Spawn one projectile. It takes part in the next tick.
    pub fn fire(&mut self, world: &mut SimulationWorld) -> hecs::Entity {
        let entity = world.spawn(
            EntityRole::Projectile,
            Renderable::new(self.template.visual),
            ColliderShape::Sphere {
                radius: self.template.radius,
            },
            self.template.body(),
        );
        self.fired += 1;
        tracing::debug!(
            "fired projectile #{} at {:?}",
            self.fired,
            self.template.position
        );
        entity
    }
}

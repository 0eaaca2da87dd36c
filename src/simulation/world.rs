//! Entity storage for the simulation.

use glam::Vec3;

use crate::physics::{Collider, ColliderShape, RigidBody};
use crate::render::Renderable;

/// The part an entity plays in pair enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRole {
    /// Primary dynamic body.
    Actor,
    /// Static scenery with a body, usually of infinite mass.
    Obstacle,
    /// Spawned at runtime.
    Projectile,
}

/// All simulation state owned by the frame loop.
///
/// Entities live in a [`hecs::World`] with a `(Renderable, RigidBody, Collider)`
/// bundle. Planes are stored separately: they have no body and are never drawn by the
/// pipeline. Role lists keep insertion order, which fixes the pair order.
#[derive(Default)]
pub struct SimulationWorld {
    pub(crate) entities: hecs::World,
    planes: Vec<Collider>,
    actors: Vec<hecs::Entity>,
    obstacles: Vec<hecs::Entity>,
    projectiles: Vec<hecs::Entity>,
}

impl SimulationWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity whose collider is driven by `body`.
    ///
    /// Derived data is computed immediately and the renderable starts at the body pose.
    pub fn spawn(
        &mut self,
        role: EntityRole,
        mut renderable: Renderable,
        shape: ColliderShape,
        mut body: RigidBody,
    ) -> hecs::Entity {
        debug_assert!(
            !matches!(shape, ColliderShape::Plane { .. }),
            "planes are added with add_plane"
        );
        body.calculate_derived_data();
        renderable.set_pose(body.position, body.orientation);

        let entity = self.entities.reserve_entity();
        let mut collider = Collider::new(shape, entity);
        collider.calculate_derived_data(Some(&body));
        self.entities.spawn_at(entity, (renderable, body, collider));

        match role {
            EntityRole::Actor => self.actors.push(entity),
            EntityRole::Obstacle => self.obstacles.push(entity),
            EntityRole::Projectile => self.projectiles.push(entity),
        }
        entity
    }

    /// Add a static plane. Returns its index.
    pub fn add_plane(&mut self, normal: Vec3, offset: f32) -> usize {
        self.planes.push(Collider::plane(normal, offset));
        self.planes.len() - 1
    }

    pub fn planes(&self) -> &[Collider] {
        &self.planes
    }

    pub fn actors(&self) -> &[hecs::Entity] {
        &self.actors
    }

    pub fn obstacles(&self) -> &[hecs::Entity] {
        &self.obstacles
    }

    pub fn projectiles(&self) -> &[hecs::Entity] {
        &self.projectiles
    }

    /// Number of body-carrying entities (planes excluded).
    pub fn entity_count(&self) -> usize {
        self.actors.len() + self.obstacles.len() + self.projectiles.len()
    }

    /// Every body-carrying entity: actors, obstacles, then projectiles.
    pub fn bodies_in_order(&self) -> impl Iterator<Item = hecs::Entity> + '_ {
        self.actors
            .iter()
            .chain(&self.obstacles)
            .chain(&self.projectiles)
            .copied()
    }

    pub fn body(&self, entity: hecs::Entity) -> Option<hecs::Ref<'_, RigidBody>> {
        self.entities.get::<&RigidBody>(entity).ok()
    }

    pub fn body_mut(&mut self, entity: hecs::Entity) -> Option<hecs::RefMut<'_, RigidBody>> {
        self.entities.get::<&mut RigidBody>(entity).ok()
    }

    pub fn collider(&self, entity: hecs::Entity) -> Option<hecs::Ref<'_, Collider>> {
        self.entities.get::<&Collider>(entity).ok()
    }

    pub fn renderable(&self, entity: hecs::Entity) -> Option<hecs::Ref<'_, Renderable>> {
        self.entities.get::<&Renderable>(entity).ok()
    }

    /// Underlying entity storage.
    pub fn entities(&self) -> &hecs::World {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{MeshHandle, ShaderHandle, Visual};
    use glam::{Quat, Vec4};

    fn visual() -> Visual {
        Visual::new(ShaderHandle(0), MeshHandle(0), Vec4::ONE)
    }

    #[test]
    fn test_spawn_places_renderable_at_body() {
        let mut world = SimulationWorld::new();
        let mut body = RigidBody::new(Vec3::new(1.0, 2.0, 3.0));
        body.orientation = Quat::from_rotation_x(0.5);

        let entity = world.spawn(
            EntityRole::Actor,
            Renderable::new(visual()),
            ColliderShape::Sphere { radius: 1.0 },
            body,
        );

        let renderable = world.renderable(entity).expect("renderable");
        let body = world.body(entity).expect("body");
        assert_eq!(renderable.position, body.position);
        assert_eq!(renderable.rotation, body.orientation);

        let collider = world.collider(entity).expect("collider");
        assert_eq!(collider.body(), Some(entity));
        assert_eq!(collider.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_roles_keep_insertion_order() {
        let mut world = SimulationWorld::new();
        let shape = ColliderShape::Sphere { radius: 0.5 };
        let p0 = world.spawn(
            EntityRole::Projectile,
            Renderable::new(visual()),
            shape,
            RigidBody::new(Vec3::ZERO),
        );
        let a0 = world.spawn(
            EntityRole::Actor,
            Renderable::new(visual()),
            shape,
            RigidBody::new(Vec3::X),
        );
        let o0 = world.spawn(
            EntityRole::Obstacle,
            Renderable::new(visual()),
            shape,
            RigidBody::new_static(Vec3::Y),
        );
        world.add_plane(Vec3::Y, 0.0);

        assert_eq!(world.entity_count(), 3);
        assert_eq!(world.planes().len(), 1);
        let order: Vec<_> = world.bodies_in_order().collect();
        assert_eq!(order, vec![a0, o0, p0]);
    }
}

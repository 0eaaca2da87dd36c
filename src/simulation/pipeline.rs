//! The per-frame simulation pipeline.
//!
//! Every tick runs, in order:
//!
//! 1. integrate every body once
//! 2. refresh collider derived data from the new poses
//! 3. detect contacts for every candidate pair
//! 4. resolve contacts (skipped when there are none)
//! 5. copy body poses into renderables
//!
//! Drawing happens afterwards, in the app's render callback.

use crate::physics::{Collider, Contact, ContactMaterial, PhysicsBackend, RigidBody};
use crate::render::Renderable;

use super::pairs::{collect_candidate_pairs, collider_of, CandidatePair};
use super::world::SimulationWorld;

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Material copied onto every contact. Default: restitution 0.9, friction 0.1.
    pub contact_material: ContactMaterial,
    /// Resolver iterations granted per detected contact. Default: 8.
    pub iterations_per_contact: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            contact_material: ContactMaterial::default(),
            iterations_per_contact: 8,
        }
    }
}

impl SimulationConfig {
    pub fn contact_material(mut self, material: ContactMaterial) -> Self {
        self.contact_material = material;
        self
    }

    pub fn iterations_per_contact(mut self, iterations: usize) -> Self {
        self.iterations_per_contact = iterations;
        self
    }
}

/// Summary of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Bodies passed to the integrator.
    pub integrated: usize,
    /// Contacts detected this tick.
    pub contacts: usize,
    /// Iteration budget handed to the resolver, `None` if it was not called.
    pub resolver_iterations: Option<usize>,
}

/// Runs the five pipeline steps against a [`SimulationWorld`].
///
/// Contact and pair buffers are reused between ticks.
pub struct FramePipeline<B: PhysicsBackend> {
    backend: B,
    config: SimulationConfig,
    contacts: Vec<Contact>,
    pairs: Vec<CandidatePair>,
    order: Vec<hecs::Entity>,
}

impl<B: PhysicsBackend> FramePipeline<B> {
    pub fn new(backend: B, config: SimulationConfig) -> Self {
        Self {
            backend,
            config,
            contacts: Vec::new(),
            pairs: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Contacts detected by the last [`detect_contacts`](Self::detect_contacts).
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Run one full tick.
    pub fn step(&mut self, world: &mut SimulationWorld, dt: f32) -> FrameReport {
        let integrated = self.integrate(world, dt);
        self.refresh_derived_data(world);
        let contacts = self.detect_contacts(world);
        let resolver_iterations = self.resolve_contacts(world, dt);
        self.sync_renderables(world);

        let report = FrameReport {
            integrated,
            contacts,
            resolver_iterations,
        };
        tracing::trace!("tick: {:?}", report);
        report
    }

    /// Step 1. Returns the number of bodies integrated.
    pub fn integrate(&mut self, world: &mut SimulationWorld, dt: f32) -> usize {
        self.load_order(world);
        let mut integrated = 0;
        for &entity in &self.order {
            match world.entities.query_one_mut::<&mut RigidBody>(entity) {
                Ok(body) => {
                    self.backend.integrate(body, dt);
                    integrated += 1;
                }
                Err(_) => debug_assert!(false, "entity {:?} has no rigid body", entity),
            }
        }
        integrated
    }

    /// Step 2.
    pub fn refresh_derived_data(&mut self, world: &mut SimulationWorld) {
        self.load_order(world);
        for &entity in &self.order {
            match world
                .entities
                .query_one_mut::<(&RigidBody, &mut Collider)>(entity)
            {
                Ok((body, collider)) => self.backend.recompute_derived_data(collider, Some(body)),
                Err(_) => debug_assert!(false, "entity {:?} has no collider", entity),
            }
        }
    }

    /// Step 3. Rebuilds the contact list and returns its length.
    pub fn detect_contacts(&mut self, world: &SimulationWorld) -> usize {
        self.contacts.clear();
        self.pairs.clear();
        collect_candidate_pairs(world, &mut self.pairs);

        let material = self.config.contact_material;
        for pair in &self.pairs {
            let (Some(a), Some(b)) = (collider_of(world, pair.first), collider_of(world, pair.second))
            else {
                debug_assert!(false, "missing collider for pair {:?}", pair);
                continue;
            };
            self.backend
                .detect_collisions(&a, &b, material, &mut self.contacts);
        }
        self.contacts.len()
    }

    /// Step 4. Returns the iteration budget, or `None` when nothing was in contact.
    pub fn resolve_contacts(&mut self, world: &mut SimulationWorld, dt: f32) -> Option<usize> {
        if self.contacts.is_empty() {
            return None;
        }
        let iterations = self.config.iterations_per_contact * self.contacts.len();
        self.backend
            .resolve_contacts(iterations, &mut self.contacts, &mut world.entities, dt);
        Some(iterations)
    }

    /// Step 5. One-way copy of body poses into renderables.
    pub fn sync_renderables(&mut self, world: &mut SimulationWorld) {
        self.load_order(world);
        for &entity in &self.order {
            match world
                .entities
                .query_one_mut::<(&RigidBody, &mut Renderable)>(entity)
            {
                Ok((body, renderable)) => renderable.set_pose(body.position, body.orientation),
                Err(_) => debug_assert!(false, "entity {:?} has no renderable", entity),
            }
        }
    }

    fn load_order(&mut self, world: &SimulationWorld) {
        self.order.clear();
        self.order.extend(world.bodies_in_order());
    }
}

impl<B: PhysicsBackend + Default> Default for FramePipeline<B> {
    fn default() -> Self {
        Self::new(B::default(), SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{cuboid_inertia, ColliderShape, CpuPhysics};
    use crate::render::{MeshHandle, ShaderHandle, Visual};
    use crate::simulation::EntityRole;
    use glam::{Quat, Vec3, Vec4};

    const DT: f32 = 1.0 / 60.0;

    /// Wraps the CPU backend and counts resolver calls.
    #[derive(Default)]
    struct CountingBackend {
        inner: CpuPhysics,
        resolve_calls: usize,
        last_budget: Option<usize>,
    }

    impl PhysicsBackend for CountingBackend {
        fn integrate(&mut self, body: &mut RigidBody, dt: f32) {
            self.inner.integrate(body, dt);
        }

        fn recompute_derived_data(&mut self, collider: &mut Collider, body: Option<&RigidBody>) {
            self.inner.recompute_derived_data(collider, body);
        }

        fn detect_collisions(
            &mut self,
            a: &Collider,
            b: &Collider,
            material: ContactMaterial,
            contacts: &mut Vec<Contact>,
        ) -> bool {
            self.inner.detect_collisions(a, b, material, contacts)
        }

        fn resolve_contacts(
            &mut self,
            iterations: usize,
            contacts: &mut [Contact],
            world: &mut hecs::World,
            dt: f32,
        ) {
            self.resolve_calls += 1;
            self.last_budget = Some(iterations);
            self.inner.resolve_contacts(iterations, contacts, world, dt);
        }
    }

    fn renderable() -> Renderable {
        Renderable::new(Visual::new(ShaderHandle(0), MeshHandle(0), Vec4::ONE))
    }

    fn falling_box(world: &mut SimulationWorld, height: f32) -> hecs::Entity {
        let mut body = RigidBody::new(Vec3::new(0.0, height, 0.0));
        body.set_mass(8.0);
        body.set_inertia_tensor(cuboid_inertia(8.0, Vec3::ONE));
        body.acceleration = Vec3::new(0.0, -9.81, 0.0);
        world.spawn(
            EntityRole::Actor,
            renderable(),
            ColliderShape::Box {
                half_size: Vec3::ONE,
            },
            body,
        )
    }

    fn projectile(world: &mut SimulationWorld, position: Vec3, velocity: Vec3) -> hecs::Entity {
        let mut body = RigidBody::new(position);
        body.set_mass(1.5);
        body.velocity = velocity;
        world.spawn(
            EntityRole::Projectile,
            renderable(),
            ColliderShape::Sphere { radius: 0.2 },
            body,
        )
    }

    #[test]
    fn test_no_contacts_skips_resolver() {
        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);
        projectile(&mut world, Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.0, 0.0, -40.0));
        let mut pipeline = FramePipeline::new(CountingBackend::default(), SimulationConfig::default());

        for _ in 0..10 {
            let report = pipeline.step(&mut world, DT);
            assert_eq!(report.contacts, 0);
            assert_eq!(report.resolver_iterations, None);
        }
        assert_eq!(pipeline.backend().resolve_calls, 0);
    }

    #[test]
    fn test_resolver_budget_is_eight_per_contact() {
        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);
        // Sunk 0.05 into the ground: four penetrating corners.
        falling_box(&mut world, 0.95);
        let mut pipeline = FramePipeline::new(CountingBackend::default(), SimulationConfig::default());

        pipeline.refresh_derived_data(&mut world);
        let contacts = pipeline.detect_contacts(&world);
        let budget = pipeline.resolve_contacts(&mut world, DT);

        assert_eq!(contacts, 4);
        assert_eq!(budget, Some(32));
        assert_eq!(pipeline.backend().last_budget, Some(32));
        assert_eq!(pipeline.backend().resolve_calls, 1);
    }

    #[test]
    fn test_detection_is_repeatable() {
        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);
        let cube = falling_box(&mut world, 0.9);
        if let Some(mut body) = world.body_mut(cube) {
            body.orientation = Quat::from_rotation_z(0.1);
        }
        projectile(&mut world, Vec3::new(1.1, 0.5, 0.0), Vec3::ZERO);
        let mut pipeline = FramePipeline::<CpuPhysics>::default();

        pipeline.refresh_derived_data(&mut world);
        pipeline.detect_contacts(&world);
        let first = pipeline.contacts().to_vec();
        pipeline.detect_contacts(&world);

        assert!(!first.is_empty());
        assert_eq!(first, pipeline.contacts());
    }

    #[test]
    fn test_box_comes_to_rest_on_ground() {
        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);
        let cube = falling_box(&mut world, 10.0);
        let mut pipeline = FramePipeline::<CpuPhysics>::default();

        const TICKS: usize = 3600;
        const SETTLED_FROM: usize = TICKS - 60;
        let mut lowest = f32::MAX;
        for tick in 0..TICKS {
            pipeline.step(&mut world, DT);
            let body = world.body(cube).expect("box body");
            lowest = lowest.min(body.position.y);
            if tick >= SETTLED_FROM {
                assert!(
                    (body.position.y - 1.0).abs() < 0.1,
                    "box not resting on its face at tick {}: y = {}",
                    tick,
                    body.position.y
                );
                assert!(
                    body.velocity.length() < 0.1,
                    "box still moving at tick {}: {:?}",
                    tick,
                    body.velocity
                );
            }
        }

        let body = world.body(cube).expect("box body");
        assert!(lowest >= 0.0, "box centre went below the ground: {}", lowest);
        let drift = Vec3::new(body.position.x, 0.0, body.position.z).length();
        assert!(drift < 3.0, "box wandered {} sideways from a vertical drop", drift);
    }

    #[test]
    fn test_projectile_flies_straight() {
        let mut world = SimulationWorld::new();
        let bullet = projectile(&mut world, Vec3::new(0.0, 1.5, 20.0), Vec3::new(0.0, 0.0, -40.0));
        let mut pipeline = FramePipeline::<CpuPhysics>::default();

        let mut z = world.body(bullet).map(|b| b.position.z).unwrap_or(f32::NAN);
        for _ in 0..30 {
            pipeline.step(&mut world, DT);
            let next = world.body(bullet).map(|b| b.position.z).unwrap_or(f32::NAN);
            let dz = next - z;
            assert!(dz < 0.0, "z did not decrease: {}", dz);
            assert!((dz - (-40.0 * DT)).abs() < 0.01, "unexpected step {}", dz);
            z = next;
        }
    }

    #[test]
    fn test_obstacle_unmoved_by_hits() {
        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);
        let board = world.spawn(
            EntityRole::Obstacle,
            renderable(),
            ColliderShape::Box {
                half_size: Vec3::new(0.5, 2.0, 0.25),
            },
            RigidBody::new_static(Vec3::new(0.0, 2.0, -10.0)),
        );
        let before = world.body(board).map(|b| (b.position, b.orientation));
        projectile(&mut world, Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 0.0, -40.0));
        let mut pipeline = FramePipeline::new(CountingBackend::default(), SimulationConfig::default());

        for _ in 0..60 {
            pipeline.step(&mut world, DT);
        }

        let after = world.body(board).map(|b| (b.position, b.orientation));
        assert_eq!(before, after);
        assert!(pipeline.backend().resolve_calls > 0, "bullet never hit the board");
    }

    #[test]
    fn test_renderables_follow_bodies() {
        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);
        let cube = falling_box(&mut world, 3.0);
        let mut pipeline = FramePipeline::<CpuPhysics>::default();

        for _ in 0..20 {
            pipeline.step(&mut world, DT);
            let body = world.body(cube).expect("body");
            let renderable = world.renderable(cube).expect("renderable");
            assert_eq!(renderable.position, body.position);
            assert_eq!(renderable.rotation, body.orientation);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "has no renderable")]
    fn test_sync_flags_missing_renderable() {
        let mut world = SimulationWorld::new();
        let cube = falling_box(&mut world, 3.0);
        world
            .entities
            .remove_one::<Renderable>(cube)
            .expect("renderable removed");
        let mut pipeline = FramePipeline::<CpuPhysics>::default();

        pipeline.sync_renderables(&mut world);
    }
}

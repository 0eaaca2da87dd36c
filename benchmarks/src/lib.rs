//! Scene builders shared by the benches.

use ballistic::physics::cuboid_inertia;
use ballistic::{
    ColliderShape, EntityRole, MeshHandle, ProjectileTemplate, RigidBody, ShaderHandle,
    SimulationWorld, Spawner, Visual,
};
use glam::{Vec3, Vec4};

fn visual() -> Visual {
    Visual::new(ShaderHandle(0), MeshHandle(0), Vec4::ONE)
}

/// The demo layout without a renderer: ground plane, one box and one backboard.
pub fn setup_scene() -> SimulationWorld {
    let mut world = SimulationWorld::new();
    world.add_plane(Vec3::Y, 0.0);

    let half_size = Vec3::ONE;
    let mut cube = RigidBody::new(Vec3::new(0.0, 5.0, 0.0));
    cube.set_mass(8.0);
    cube.set_inertia_tensor(cuboid_inertia(8.0, half_size));
    cube.acceleration = Vec3::new(0.0, -9.81, 0.0);
    world.spawn(
        EntityRole::Actor,
        ballistic::Renderable::new(visual()),
        ColliderShape::Box { half_size },
        cube,
    );

    world.spawn(
        EntityRole::Obstacle,
        ballistic::Renderable::new(visual()),
        ColliderShape::Box {
            half_size: Vec3::new(0.5, 2.0, 0.25),
        },
        RigidBody::new_static(Vec3::new(0.0, 2.0, -10.0)),
    );
    world
}

/// The demo layout with `n` projectiles fired, fanned out so they do not all overlap.
pub fn setup_with_projectiles(n: usize) -> SimulationWorld {
    let mut world = setup_scene();
    let mut spawner = Spawner::new(ProjectileTemplate::new(visual()));
    for i in 0..n {
        let offset = (i as f32 - n as f32 * 0.5) * 0.5;
        spawner.template_mut().position = Vec3::new(offset, 1.5, 20.0);
        spawner.fire(&mut world);
    }
    world
}

/// `n` projectiles stacked on one spot, so every projectile pair is in contact.
pub fn setup_crowded(n: usize) -> SimulationWorld {
    let mut world = setup_scene();
    let mut spawner = Spawner::new(ProjectileTemplate::new(visual()));
    spawner.template_mut().velocity = Vec3::ZERO;
    for i in 0..n {
        spawner.template_mut().position = Vec3::new(0.0, 0.15 + i as f32 * 0.01, 5.0);
        spawner.fire(&mut world);
    }
    world
}

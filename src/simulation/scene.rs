//! The ballistic demo scene: a box, a backboard, a ground plane and a gun.

use glam::{Quat, Vec3, Vec4};

use crate::app::{App, Key, KeyEvent, LoopControl};
use crate::error::SetupError;
use crate::physics::{cuboid_inertia, ColliderShape, CpuPhysics, RigidBody};
use crate::render::{
    Camera, MeshData, RenderBackend, Renderable, Viewport, Visual, DIFFUSE_COLOR_SHADER,
};

use super::pipeline::{FramePipeline, SimulationConfig};
use super::spawner::{ProjectileTemplate, Spawner};
use super::world::{EntityRole, SimulationWorld};

const BOX_HALF_SIZE: Vec3 = Vec3::ONE;
const BOX_MASS: f32 = 8.0;
const BACKBOARD_HALF_SIZE: Vec3 = Vec3::new(0.5, 2.0, 0.25);
const GROUND_EXTENT: f32 = 500.0;

/// Everything the demo needs once the renderer is available.
pub struct BallisticScene {
    pub world: SimulationWorld,
    pub pipeline: FramePipeline<CpuPhysics>,
    pub spawner: Spawner,
    pub camera: Camera,
    pub cube: hecs::Entity,
    pub backboard: hecs::Entity,
    ground: Renderable,
}

impl BallisticScene {
    /// Compile shaders, upload meshes and populate the world.
    pub fn build(
        renderer: &mut dyn RenderBackend,
        config: SimulationConfig,
    ) -> Result<Self, SetupError> {
        let shader = renderer.compile_shader(&DIFFUSE_COLOR_SHADER)?;
        let cube_mesh = renderer.create_mesh(&MeshData::cuboid(-BOX_HALF_SIZE, BOX_HALF_SIZE));
        let backboard_mesh =
            renderer.create_mesh(&MeshData::cuboid(-BACKBOARD_HALF_SIZE, BACKBOARD_HALF_SIZE));
        let sphere_mesh = renderer.create_mesh(&MeshData::sphere(0.2, 16, 16));
        let ground_mesh = renderer.create_mesh(&MeshData::plane_xz(
            -GROUND_EXTENT,
            -GROUND_EXTENT,
            GROUND_EXTENT,
            GROUND_EXTENT,
            0.0,
        ));

        let mut world = SimulationWorld::new();
        world.add_plane(Vec3::Y, 0.0);

        let mut cube_body = RigidBody::new(Vec3::new(0.0, 5.0, 0.0));
        cube_body.set_mass(BOX_MASS);
        cube_body.set_inertia_tensor(cuboid_inertia(BOX_MASS, BOX_HALF_SIZE));
        cube_body.acceleration = Vec3::new(0.0, -9.81, 0.0);
        let cube = world.spawn(
            EntityRole::Actor,
            Renderable::new(Visual::new(shader, cube_mesh, Vec4::new(1.0, 0.0, 0.0, 1.0))),
            ColliderShape::Box {
                half_size: BOX_HALF_SIZE,
            },
            cube_body,
        );

        let backboard = world.spawn(
            EntityRole::Obstacle,
            Renderable::new(Visual::new(
                shader,
                backboard_mesh,
                Vec4::new(0.25, 0.2, 0.2, 1.0),
            )),
            ColliderShape::Box {
                half_size: BACKBOARD_HALF_SIZE,
            },
            RigidBody::new_static(Vec3::new(0.0, 2.0, -10.0)),
        );

        let mut ground = Renderable::new(Visual::new(
            shader,
            ground_mesh,
            Vec4::new(0.6, 0.6, 0.6, 1.0),
        ));
        ground.set_pose(Vec3::ZERO, Quat::IDENTITY);

        tracing::debug!("ballistic scene ready with {} entities", world.entity_count());

        Ok(Self {
            world,
            pipeline: FramePipeline::new(CpuPhysics, config),
            spawner: Spawner::new(ProjectileTemplate::with_visual(shader, sphere_mesh)),
            camera: Camera::look_at(Vec3::new(-3.0, 3.0, 15.0), Vec3::new(0.0, 1.0, 0.0)),
            cube,
            backboard,
            ground,
        })
    }

    /// Draw the ground and every entity at its synced pose.
    pub fn draw(&self, viewport: Viewport, renderer: &mut dyn RenderBackend) {
        let projection = self.camera.projection_matrix(viewport.aspect());
        let view = self.camera.view_matrix();

        renderer.draw(&self.ground, projection, view);
        for entity in self.world.bodies_in_order() {
            if let Some(renderable) = self.world.renderable(entity) {
                renderer.draw(&renderable, projection, view);
            }
        }
    }
}

/// The demo as an [`App`]: Space fires a projectile, Escape quits.
#[derive(Default)]
pub struct BallisticApp {
    config: SimulationConfig,
    scene: Option<BallisticScene>,
}

impl BallisticApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            scene: None,
        }
    }

    /// The scene, once setup has run.
    pub fn scene(&self) -> Option<&BallisticScene> {
        self.scene.as_ref()
    }
}

impl App for BallisticApp {
    fn on_setup(&mut self, renderer: &mut dyn RenderBackend) -> Result<(), SetupError> {
        self.scene = Some(BallisticScene::build(renderer, self.config)?);
        Ok(())
    }

    fn on_key(&mut self, event: KeyEvent) -> LoopControl {
        if event.is_press(Key::Escape) {
            return LoopControl::Exit;
        }
        if event.is_press(Key::Space) {
            if let Some(scene) = self.scene.as_mut() {
                scene.spawner.fire(&mut scene.world);
            }
        }
        LoopControl::Continue
    }

    fn on_update(&mut self, dt: f64) {
        if let Some(scene) = self.scene.as_mut() {
            scene.pipeline.step(&mut scene.world, dt as f32);
        }
    }

    fn on_render(&mut self, _dt: f64, viewport: Viewport, renderer: &mut dyn RenderBackend) {
        if let Some(scene) = self.scene.as_ref() {
            scene.draw(viewport, renderer);
        }
    }
}

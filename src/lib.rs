//! Ballistic
//!
//! A frame-driven rigid-body simulation pipeline glued to a small wgpu front end.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **physics** - Rigid bodies, colliders, contacts and the `PhysicsBackend` facade
//! 2. **simulation** - Entity storage, the per-frame pipeline, pair policy, spawner, scenes
//! 3. **render** - Renderables, camera, mesh generation and the `RenderBackend` seam
//! 4. **app** - `App` trait and the headless `FrameLoop`
//! 5. **window** - winit/wgpu window driving an `App` (feature = "window")
//!
//! Each frame runs, in order: integrate → refresh derived data → detect contacts →
//! resolve contacts → sync renderables → draw.

pub mod app;
pub mod error;
pub mod physics;
pub mod render;
pub mod simulation;

#[cfg(feature = "window")]
pub mod window;

pub use app::{App, FrameLoop, Key, KeyAction, KeyEvent, LoopConfig, LoopControl, Modifiers};
pub use error::SetupError;
pub use physics::{
    Collider, ColliderShape, Contact, ContactMaterial, CpuPhysics, PhysicsBackend, RigidBody,
};
pub use render::{
    Camera, HeadlessRenderer, MeshData, MeshHandle, RenderBackend, Renderable, ShaderHandle,
    ShaderSource, Viewport, Visual,
};
pub use simulation::{
    BallisticApp, EntityRole, FramePipeline, FrameReport, ProjectileTemplate, SimulationConfig,
    SimulationWorld, Spawner,
};

#[cfg(feature = "window")]
pub use window::{run, WindowSettings};

// Re-export math and entity crates for convenience
pub use glam;
pub use hecs;

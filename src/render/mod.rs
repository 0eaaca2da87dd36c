//! Rendering collaborator: renderables, camera, meshes and the backend seam.
//!
//! The simulation only sees [`RenderBackend`]. The wgpu implementation lives in
//! [`gpu`] behind the `window` feature; [`HeadlessRenderer`] records draws without a GPU.

pub mod camera;
pub mod geometry;
mod headless;
pub mod renderable;

#[cfg(feature = "window")]
pub mod gpu;

pub use camera::Camera;
pub use geometry::{MeshData, Vertex};
pub use headless::{DrawCall, HeadlessRenderer};
pub use renderable::{MeshHandle, Renderable, ShaderHandle, Visual};

use glam::Mat4;

use crate::error::SetupError;

/// A WGSL vertex/fragment pair.
///
/// The vertex source must define `vs_main` and the fragment source `fs_main`. Both bind
/// the per-draw uniform (view-projection, model, color) at group 0, binding 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub label: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl ShaderSource {
    pub const VERTEX_ENTRY: &'static str = "vs_main";
    pub const FRAGMENT_ENTRY: &'static str = "fs_main";
}

/// Flat color with a single directional light.
pub const DIFFUSE_COLOR_SHADER: ShaderSource = ShaderSource {
    label: "diffuse color",
    vertex: include_str!("shaders/diffuse_color.vert.wgsl"),
    fragment: include_str!("shaders/diffuse_color.frag.wgsl"),
};

/// Size of the drawable area in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, 1.0 for a degenerate viewport.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// What the frame loop needs from a renderer.
pub trait RenderBackend {
    /// Compile a shader pair. Failure is fatal to setup.
    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, SetupError>;

    /// Upload geometry and return a handle for later draws.
    fn create_mesh(&mut self, mesh: &MeshData) -> MeshHandle;

    /// Draw `renderable` at its current pose.
    fn draw(&mut self, renderable: &Renderable, projection: Mat4, view: Mat4);
}

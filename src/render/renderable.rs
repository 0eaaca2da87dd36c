//! Drawable state attached to entities.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Opaque handle to a compiled shader program owned by a [`RenderBackend`](super::RenderBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Opaque handle to uploaded mesh geometry owned by a [`RenderBackend`](super::RenderBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// What to draw: shader, geometry and flat colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub shader: ShaderHandle,
    pub mesh: MeshHandle,
    /// Linear RGBA.
    pub color: Vec4,
}

impl Visual {
    pub fn new(shader: ShaderHandle, mesh: MeshHandle, color: Vec4) -> Self {
        Self {
            shader,
            mesh,
            color,
        }
    }
}

/// A visual placed in the world.
///
/// For simulated entities the pose is overwritten from the rigid body at the end of
/// every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub position: Vec3,
    pub rotation: Quat,
    pub visual: Visual,
}

impl Renderable {
    pub fn new(visual: Visual) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            visual,
        }
    }

    pub fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }

    /// Model matrix for the current pose.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

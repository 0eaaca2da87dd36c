use glam::Mat4;

use super::{MeshData, MeshHandle, RenderBackend, Renderable, ShaderHandle, ShaderSource};
use crate::error::SetupError;

/// One recorded draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub renderable: Renderable,
    pub projection: Mat4,
    pub view: Mat4,
}

/// A [`RenderBackend`] that keeps meshes on the CPU and records draw calls.
///
/// Shader "compilation" checks that both stages declare their entry point.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    shaders: Vec<ShaderSource>,
    meshes: Vec<MeshData>,
    draws: Vec<DrawCall>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Forget recorded draws, as a presented frame would.
    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for HeadlessRenderer {
    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, SetupError> {
        let stages = [
            (source.vertex, "@vertex", ShaderSource::VERTEX_ENTRY),
            (source.fragment, "@fragment", ShaderSource::FRAGMENT_ENTRY),
        ];
        for (code, attribute, entry) in stages {
            if !code.contains(attribute) || !code.contains(&format!("fn {}", entry)) {
                return Err(SetupError::ShaderCompilation {
                    label: source.label.to_string(),
                    message: format!("missing {} entry point `{}`", attribute, entry),
                });
            }
        }
        self.shaders.push(*source);
        Ok(ShaderHandle(self.shaders.len() as u32 - 1))
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshHandle {
        self.meshes.push(mesh.clone());
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn draw(&mut self, renderable: &Renderable, projection: Mat4, view: Mat4) {
        self.draws.push(DrawCall {
            renderable: *renderable,
            projection,
            view,
        });
    }
}

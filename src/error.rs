//! Setup errors.
//!
//! Only initialisation can fail. Once the frame loop is running, the simulation has no
//! recoverable error path.

use thiserror::Error;

/// Fatal errors raised while bringing up the GPU, the window or the scene.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A WGSL vertex/fragment pair failed validation.
    #[error("failed to compile shader `{label}`: {message}")]
    ShaderCompilation { label: String, message: String },

    /// No GPU adapter is compatible with the window surface.
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created.
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_error_message() {
        let err = SetupError::ShaderCompilation {
            label: "diffuse color".to_string(),
            message: "unknown identifier `colour`".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("diffuse color"), "message was: {}", text);
        assert!(text.contains("colour"), "message was: {}", text);
    }
}

//! GPU rendering with wgpu.

mod context;
mod renderer;

pub use context::{DepthTexture, GpuContext};
pub use renderer::WgpuRenderer;

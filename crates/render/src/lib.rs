//! Multi-pass scene renderer.
//!
//! The renderer walks a [`viewport_scene::Scene`] once per pass and issues
//! commands to a [`GpuBackend`]. Passes render offscreen (shadow map, color,
//! guides, selection index, lighting) and a fullscreen composite presents
//! the result. [`RecordingBackend`] keeps the command stream for tests and
//! headless traces; the wgpu backend lives in its own crate.
//!
//! # Invariants
//! - Drawing never changes object placement; it only refreshes derived
//!   matrices and camera sensors.
//! - GPU buffers, textures and material programs belong to one scene and are
//!   released when a different scene is drawn.
//! - A uniform is uploaded only when its value differs from the last value
//!   uploaded to that program.

mod backend;
mod cache;
mod composite;
mod config;
mod error;
mod info;
mod pass;
mod recording;
mod renderer;
mod uniform_cache;
mod vertex;

pub use backend::{
    Attachment, Clear, GpuBackend, MeshHandle, PassState, ProgramHandle, RenderTarget, TargetDesc, TargetHandle,
    TextureHandle, TextureUnit, UniformValue, uniform,
};
pub use cache::{MeshCache, MeshKey, TextureCache};
pub use composite::{CompositeParams, index_value, screen_quad};
pub use config::RenderConfig;
pub use error::{ConfigError, RenderError};
pub use info::RenderInfo;
pub use pass::{CameraSource, PassContent, PassDesc, PassFilter, RenderPass, standard_passes};
pub use recording::{Command, RecordingBackend, ResourceCounts};
pub use renderer::Renderer;
pub use uniform_cache::{ShaderInstance, UniformCache};
pub use vertex::{Instance, Vertex};

pub fn crate_info() -> &'static str {
    "viewport-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

//! wgpu backend for the viewport renderer.
//!
//! Implements [`viewport_render::GpuBackend`] on a window surface or a
//! headless output texture. Programs are WGSL modules sharing one uniform
//! block layout and one texture-unit bind group; pipelines are created on
//! first use per program, draw mode, target format and pass state.
//!
//! # Invariants
//! - A frame is encoded and submitted only by `end_frame`.
//! - Depth attachments are read with `textureLoad`, never sampled.

mod gpu;
mod pipeline;
mod shaders;
mod uniforms;

pub use gpu::{COLOR_FORMAT, WgpuBackend};
pub use pipeline::{DEPTH_FORMAT, PipelineCache, PipelineKey};
pub use shaders::source as shader_source;
pub use uniforms::UniformBlock;

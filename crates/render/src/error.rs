use std::path::PathBuf;

use viewport_assets::AssetError;
use viewport_scene::{SceneError, ShaderKind};

/// Errors from the render pipeline and its backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{kind:?} program failed to build: {reason}")]
    ProgramCompile { kind: ShaderKind, reason: String },
    #[error("no program loaded for {0:?}")]
    MissingProgram(ShaderKind),
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("draw issued outside a render pass")]
    NotInPass,
    #[error("a render pass is already open")]
    PassOpen,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Errors reading or writing a [`crate::RenderConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid render config: {0}")]
    Parse(#[from] serde_json::Error),
}

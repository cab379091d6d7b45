/// Errors from resource operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("resource {name} is a {found}, expected {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("image is {width}x{height} but has {len} bytes")]
    ImageSize { width: u32, height: u32, len: usize },
    #[error("mesh {0}")]
    InvalidMesh(String),
}

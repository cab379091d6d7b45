//! Resource loading: decoded images, mesh data and shader sources.
//!
//! Resources are requested by logical name through a [`ResourceLoader`] and
//! collected into a [`ResourceStore`] before the first frame renders. Images
//! are content-addressed: the renderer binds them by [`TextureId`], never by
//! name or path.
//!
//! # Invariants
//! - `ResourceStore::load_all` is the loading barrier; a failed request is
//!   reported and skipped, never fatal.
//! - Equal pixel data yields the same `TextureId`.

mod error;
mod image;
mod loader;
mod mesh;
mod store;

pub use error::AssetError;
pub use image::{Filter, Image, Sampling, TextureId, Wrap};
pub use loader::{DirectoryLoader, MemoryLoader, Resource, ResourceKind, ResourceLoader, ResourceRequest};
pub use mesh::MeshData;
pub use store::{LoadFailure, ResourceStore};

pub fn crate_info() -> &'static str {
    "viewport-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}

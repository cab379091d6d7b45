//! Shared types for the viewport crates.
//!
//! # Invariants
//! - `Transform` stores local values only; world values are derived from the
//!   parent chain by the scene.
//! - Fingerprints hash exact bit patterns, so any change to a component is
//!   observed.

mod fingerprint;
mod types;

pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use types::{MaterialId, SceneId, Transform, euler_quat};

pub fn crate_info() -> &'static str {
    "viewport-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}

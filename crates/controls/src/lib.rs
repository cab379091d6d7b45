//! Controllers that turn pointer and keyboard input into transform edits.
//!
//! Every controller implements [`Controller`]: events arrive through
//! `handle_event` and continuous motion is applied in `update`. They write
//! straight into a [`viewport_common::Transform`], usually a camera's.

mod base;
mod first_person;
mod orbit;
mod turntable;

pub use base::{Controller, ControllerBase};
pub use first_person::{FirstPersonController, MoveMode};
pub use orbit::OrbitController;
pub use turntable::TurntableController;

pub fn crate_info() -> &'static str {
    "viewport-controls v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("controls"));
    }
}

//! Input state consumed by behaviors and controllers.
//!
//! The host shell translates platform events into [`InputState`] updates and
//! [`PointerEvent`]s; nothing downstream reads raw device events.
//!
//! # Invariants
//! - `touched` reports a key once per press and is consumed on read.
//! - Drag events are delivered in order, the first of each drag flagged.

mod event;
mod key;
mod state;

pub use event::PointerEvent;
pub use key::{Key, MouseButton};
pub use state::{DragEvent, InputState};

pub fn crate_info() -> &'static str {
    "viewport-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}

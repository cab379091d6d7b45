use crate::key::{Key, MouseButton};

/// Pointer and keyboard events delivered to controllers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { button: MouseButton, x: f32, y: f32 },
    Up { button: MouseButton },
    /// Relative motion since the previous move event.
    Move { dx: f32, dy: f32 },
    /// Wheel delta; positive scrolls away from the user.
    Wheel { delta: f32 },
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer lock was lost (focus change, escape).
    LockLost,
}

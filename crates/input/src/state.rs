use std::collections::{HashMap, VecDeque};

use crate::key::{Key, MouseButton};

/// One sample of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    pub button: MouseButton,
    pub x: f32,
    pub y: f32,
    /// Set on the first event of each drag.
    pub first: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyState {
    pressed: bool,
    touched: bool,
}

/// Current key state plus the pending drag-event stream.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashMap<Key, KeyState>,
    drag_button: Option<MouseButton>,
    drags: VecDeque<DragEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        let state = self.keys.entry(key).or_default();
        if !state.pressed {
            state.touched = true;
        }
        state.pressed = true;
    }

    pub fn release(&mut self, key: Key) {
        if let Some(state) = self.keys.get_mut(&key) {
            state.pressed = false;
        }
    }

    /// Release every key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        tracing::debug!(keys = self.keys.len(), "releasing all keys");
        for state in self.keys.values_mut() {
            state.pressed = false;
        }
    }

    pub fn pressed(&self, key: Key) -> bool {
        self.keys.get(&key).is_some_and(|s| s.pressed)
    }

    pub fn pressed_any(&self, keys: &[Key]) -> bool {
        keys.iter().any(|&k| self.pressed(k))
    }

    /// True once per press; reading consumes the trigger.
    pub fn touched(&mut self, key: Key) -> bool {
        match self.keys.get_mut(&key) {
            Some(state) if state.touched => {
                state.touched = false;
                true
            }
            _ => false,
        }
    }

    pub fn begin_drag(&mut self, button: MouseButton, x: f32, y: f32) {
        tracing::trace!(?button, x, y, "drag started");
        self.drag_button = Some(button);
        self.drags.push_back(DragEvent { button, x, y, first: true });
    }

    /// Record pointer movement; ignored when no drag is active.
    pub fn drag_to(&mut self, x: f32, y: f32) {
        if let Some(button) = self.drag_button {
            self.drags.push_back(DragEvent { button, x, y, first: false });
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(button) = self.drag_button.take() {
            tracing::trace!(?button, pending = self.drags.len(), "drag ended");
        }
    }

    pub fn dragging(&self) -> Option<MouseButton> {
        self.drag_button
    }

    /// Take all pending drag events in arrival order.
    pub fn drain_drags(&mut self) -> impl Iterator<Item = DragEvent> + '_ {
        self.drags.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_follows_press_and_release() {
        let mut input = InputState::new();
        let w = Key::char('w');
        assert!(!input.pressed(w));
        input.press(w);
        assert!(input.pressed(w));
        assert!(input.pressed_any(&[Key::Space, w]));
        input.release(w);
        assert!(!input.pressed(w));
    }

    #[test]
    fn touched_is_edge_triggered() {
        let mut input = InputState::new();
        input.press(Key::Space);
        assert!(input.touched(Key::Space));
        assert!(!input.touched(Key::Space));
        // Holding does not retrigger.
        input.press(Key::Space);
        assert!(!input.touched(Key::Space));
        input.release(Key::Space);
        input.press(Key::Space);
        assert!(input.touched(Key::Space));
    }

    #[test]
    fn drag_stream_flags_first_event() {
        let mut input = InputState::new();
        input.drag_to(1.0, 1.0);
        input.begin_drag(MouseButton::Left, 10.0, 20.0);
        input.drag_to(12.0, 20.0);
        input.end_drag();
        input.drag_to(50.0, 50.0);

        let events: Vec<_> = input.drain_drags().collect();
        assert_eq!(events.len(), 2);
        assert!(events[0].first);
        assert!(!events[1].first);
        assert_eq!(events[1].x, 12.0);
        assert_eq!(input.drain_drags().count(), 0);
    }

    #[test]
    fn release_all_clears_pressed() {
        let mut input = InputState::new();
        input.press(Key::char('a'));
        input.press(Key::char('d'));
        input.release_all();
        assert!(!input.pressed_any(&[Key::char('a'), Key::char('d')]));
    }
}

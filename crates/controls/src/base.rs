use std::collections::HashSet;
use std::time::Duration;

use viewport_common::Transform;
use viewport_input::{Key, PointerEvent};

/// Lock and key state shared by every controller.
///
/// Keys are only recorded while the pointer is locked to the viewport, so
/// typing elsewhere never moves the camera.
#[derive(Debug, Clone, Default)]
pub struct ControllerBase {
    locked: bool,
    pointer_locked: bool,
    keys: HashSet<Key>,
}

impl ControllerBase {
    /// Ignore input until [`ControllerBase::unlock`].
    pub fn lock(&mut self) {
        if !self.locked {
            tracing::debug!("controller locked");
        }
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        if self.locked {
            tracing::debug!("controller unlocked");
        }
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_pointer_lock(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Track key events. Returns whether the event was a key event.
    pub fn handle_key(&mut self, event: &PointerEvent) -> bool {
        match *event {
            PointerEvent::KeyDown(key) => {
                if self.pointer_locked {
                    self.keys.insert(key);
                }
                true
            }
            PointerEvent::KeyUp(key) => {
                self.keys.remove(&key);
                true
            }
            PointerEvent::LockLost => {
                self.pointer_locked = false;
                self.keys.clear();
                false
            }
            _ => false,
        }
    }

    /// Held key; always false while locked.
    pub fn check_key(&self, key: Key) -> bool {
        !self.locked && self.keys.contains(&key)
    }
}

/// An input state machine driving a transform.
pub trait Controller {
    fn base(&self) -> &ControllerBase;

    fn base_mut(&mut self) -> &mut ControllerBase;

    /// React to one input event.
    fn handle_event(&mut self, event: &PointerEvent, transform: &mut Transform);

    /// Apply continuous motion once per frame.
    fn update(&mut self, _transform: &mut Transform, _elapsed: Duration) {}

    fn lock(&mut self) {
        self.base_mut().lock();
    }

    fn unlock(&mut self) {
        self.base_mut().unlock();
    }
}

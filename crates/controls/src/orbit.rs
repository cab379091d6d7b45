use std::time::Duration;

use glam::Vec3;
use viewport_common::Transform;
use viewport_input::{MouseButton, PointerEvent};

use crate::base::{Controller, ControllerBase};

const DEFAULT_PITCH: f32 = 0.7;
const DEFAULT_DISTANCE: f32 = -5.0;
const DISTANCE_EPSILON: f32 = 0.2;

/// Orbits a camera around its pivot.
///
/// Left-drag rotates, right-drag pans, the wheel zooms. Zoom is eased:
/// `distance` is the target and the camera's `origin.z` follows it.
#[derive(Debug, Clone)]
pub struct OrbitController {
    base: ControllerBase,
    pub sensitivity: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    rotating: bool,
    panning: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            base: ControllerBase::default(),
            sensitivity: 0.0033,
            yaw: 0.0,
            pitch: DEFAULT_PITCH,
            distance: DEFAULT_DISTANCE,
            rotating: false,
            panning: false,
        }
    }
}

impl OrbitController {
    /// Controller with the camera placed at its starting pose.
    pub fn new(transform: &mut Transform) -> Self {
        let controller = Self::default();
        transform.position = Vec3::new(0.0, -2.0, 0.0);
        controller.apply_rotation(transform);
        controller
    }

    fn apply_rotation(&self, transform: &mut Transform) {
        transform.rotation.y = self.yaw;
        transform.rotation.x = self.pitch;
    }

    /// Restore the default angles, distance and position.
    pub fn reset(&mut self, transform: &mut Transform) {
        self.yaw = 0.0;
        self.pitch = DEFAULT_PITCH;
        self.distance = DEFAULT_DISTANCE;
        self.apply_rotation(transform);
        transform.position = Vec3::ZERO;
        tracing::debug!("orbit controller reset");
    }

    /// Whether the eased zoom has settled.
    pub fn is_settled(&self, transform: &Transform) -> bool {
        (self.distance - transform.origin.z).abs() <= DISTANCE_EPSILON
    }
}

impl Controller for OrbitController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }

    fn handle_event(&mut self, event: &PointerEvent, transform: &mut Transform) {
        if self.base.handle_key(event) {
            return;
        }
        match *event {
            PointerEvent::Down { button, .. } if !self.base.is_locked() => match button {
                MouseButton::Left => self.rotating = true,
                MouseButton::Right => self.panning = true,
                _ => {}
            },
            PointerEvent::Up { .. } => {
                self.rotating = false;
                self.panning = false;
            }
            // A drag begun before locking ends at the first move after it.
            PointerEvent::Move { .. } if self.base.is_locked() => {
                if self.rotating || self.panning {
                    tracing::debug!("orbit drag cancelled by lock");
                }
                self.rotating = false;
                self.panning = false;
            }
            PointerEvent::Wheel { delta } if !self.base.is_locked() && delta != 0.0 => {
                self.distance -= delta.signum();
            }
            PointerEvent::Move { dx, dy } => {
                let s = self.sensitivity;
                if self.rotating {
                    self.yaw += dx * s;
                    self.pitch += dy * s;
                }
                if self.panning {
                    let pan = -self.distance * 0.3 * s * 2.0;
                    let yaw = transform.rotation.y;
                    transform.position.y -= dy * pan;
                    transform.position.x += dx * pan * yaw.cos();
                    transform.position.z += dx * pan * yaw.sin();
                }
                if self.rotating || self.panning {
                    self.apply_rotation(transform);
                }
            }
            _ => {}
        }
    }

    fn update(&mut self, transform: &mut Transform, elapsed: Duration) {
        self.apply_rotation(transform);
        if self.is_settled(transform) {
            return;
        }
        let target_delta = self.distance - transform.origin.z;
        let rate = (elapsed.as_secs_f32() * 1000.0 * 0.01).min(1.0);
        transform.origin.z += target_delta * rate;
    }
}

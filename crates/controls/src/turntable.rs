use glam::Vec3;
use viewport_common::Transform;
use viewport_input::{DragEvent, MouseButton, PointerEvent};

use crate::base::{Controller, ControllerBase};

/// Keeps an entity on a circle around the origin, turned by horizontal drag.
#[derive(Debug, Clone)]
pub struct TurntableController {
    base: ControllerBase,
    pub radius: f32,
    /// Pixels of drag per radian.
    pub divisor: f32,
    pub enabled: bool,
    angle: f32,
    last_x: f32,
}

impl Default for TurntableController {
    fn default() -> Self {
        Self {
            base: ControllerBase::default(),
            radius: -32.0,
            divisor: 400.0,
            enabled: true,
            angle: 0.0,
            last_x: 0.0,
        }
    }
}

impl TurntableController {
    /// Controller with the entity placed at angle zero.
    pub fn new(transform: &mut Transform) -> Self {
        let controller = Self::default();
        controller.place(transform);
        controller
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    fn place(&self, transform: &mut Transform) {
        transform.position.x = (-self.angle).sin() * self.radius;
        transform.position.z = (-self.angle).cos() * self.radius;
        transform.rotation.y = self.angle;
    }

    pub fn set_degrees(&mut self, degrees: f32, transform: &mut Transform) {
        self.angle = degrees.to_radians();
        self.place(transform);
    }

    /// Apply one sample of the drag stream. Only the primary button turns.
    pub fn handle_drag(&mut self, drag: &DragEvent, transform: &mut Transform) {
        if drag.button != MouseButton::Left || !self.enabled || self.base.is_locked() {
            return;
        }
        if drag.first {
            self.last_x = drag.x;
        }
        self.angle += (drag.x - self.last_x) / self.divisor;
        self.last_x = drag.x;
        self.place(transform);
    }

    /// World position on the circle for the current angle.
    pub fn position(&self) -> Vec3 {
        Vec3::new((-self.angle).sin() * self.radius, 0.0, (-self.angle).cos() * self.radius)
    }
}

impl Controller for TurntableController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }

    /// Drags arrive through [`TurntableController::handle_drag`]; only key
    /// state is tracked here.
    fn handle_event(&mut self, event: &PointerEvent, _transform: &mut Transform) {
        self.base.handle_key(event);
    }
}

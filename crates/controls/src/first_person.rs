use std::time::Duration;

use glam::Vec3;
use viewport_common::Transform;
use viewport_input::{Key, MouseButton, PointerEvent};

use crate::base::{Controller, ControllerBase};

/// How key input moves the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveMode {
    /// Keys displace the position directly by `speed` per frame.
    Direct,
    /// Keys accelerate a velocity that decays by `resistance` per frame.
    Inertial { resistance: f32 },
}

/// Pointer-lock mouse look with WASD movement.
///
/// Holding the right button captures the pointer; while captured, motion
/// turns the camera and held keys move it along camera-relative axes.
#[derive(Debug, Clone)]
pub struct FirstPersonController {
    base: ControllerBase,
    pub sensitivity: f32,
    pub speed: f32,
    pub mode: MoveMode,
    velocity: Vec3,
    direction: Vec3,
}

impl Default for FirstPersonController {
    fn default() -> Self {
        Self::direct()
    }
}

impl FirstPersonController {
    pub fn direct() -> Self {
        Self {
            base: ControllerBase::default(),
            sensitivity: 0.0033,
            speed: 20.0,
            mode: MoveMode::Direct,
            velocity: Vec3::ZERO,
            direction: Vec3::ZERO,
        }
    }

    /// Smoothed movement for walking a scene.
    pub fn inertial() -> Self {
        Self {
            sensitivity: 0.00075,
            speed: 0.002,
            mode: MoveMode::Inertial { resistance: 0.95 },
            ..Self::direct()
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn step_direct(&self, transform: &mut Transform) {
        let key = |c| self.base.check_key(Key::char(c));
        let speed = self.speed;
        let mut walk = |dir: f32| {
            let a = -transform.rotation.y;
            let b = -transform.rotation.x;
            let s = speed * dir;
            transform.position.x += s * a.sin();
            transform.position.z += s * a.cos();
            transform.position.y -= s * b.sin();
        };
        if key('w') {
            walk(1.0);
        }
        if key('s') {
            walk(-1.0);
        }

        let yaw = transform.rotation.y;
        let mut strafe = |dir: f32| {
            let s = speed * dir;
            transform.position.z += s * yaw.sin();
            transform.position.x += s * yaw.cos();
        };
        if key('a') {
            strafe(1.0);
        }
        if key('d') {
            strafe(-1.0);
        }

        if key('q') {
            transform.position.y -= speed * 2.0;
        }
        if key('y') {
            transform.position.y += speed * 2.0;
        }
    }

    fn step_inertial(&mut self, transform: &mut Transform, resistance: f32) {
        let speed = self.speed;
        let key = |base: &ControllerBase, c| base.check_key(Key::char(c));
        if key(&self.base, 'w') {
            self.direction.z = speed;
        }
        if key(&self.base, 's') {
            self.direction.z = -speed;
        }
        if key(&self.base, 'a') {
            self.direction.x = speed;
        }
        if key(&self.base, 'd') {
            self.direction.x = -speed;
        }
        if key(&self.base, 'q') {
            self.direction.y = -speed;
        }
        if key(&self.base, 'y') {
            self.direction.y = speed;
        }

        let rotation = transform.rotation;
        let pitch = rotation.x.tan().clamp(-1.0, 1.0);
        let inverse = Vec3::new((-rotation.y).sin(), pitch, (-rotation.y).cos());
        let facing = Vec3::new(rotation.y.sin(), pitch, rotation.y.cos());

        let d = self.direction;
        self.velocity.x += d.z * inverse.x + d.x * facing.z;
        self.velocity.y += d.z * inverse.y + d.y;
        self.velocity.z += d.z * inverse.z + d.x * facing.x;

        transform.position += self.velocity;
        self.velocity *= resistance;
        self.direction = Vec3::ZERO;
    }
}

impl Controller for FirstPersonController {
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
            PointerEvent::Down { button: MouseButton::Right, .. } => {
                self.base.unlock();
                self.base.set_pointer_lock(true);
            }
            PointerEvent::Up { .. } if self.base.pointer_locked() => {
                self.base.set_pointer_lock(false);
            }
            PointerEvent::Move { dx, dy } if self.base.pointer_locked() => {
                transform.rotation.y += dx * self.sensitivity;
                transform.rotation.x += dy * self.sensitivity;
            }
            _ => {}
        }
    }

    fn update(&mut self, transform: &mut Transform, _elapsed: Duration) {
        match self.mode {
            MoveMode::Direct => self.step_direct(transform),
            MoveMode::Inertial { resistance } => self.step_inertial(transform, resistance),
        }
    }

    /// Locking also releases the pointer.
    fn lock(&mut self) {
        self.base.lock();
        self.base.set_pointer_lock(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(controller: &mut FirstPersonController, transform: &mut Transform) {
        controller.handle_event(
            &PointerEvent::Down { button: MouseButton::Right, x: 0.0, y: 0.0 },
            transform,
        );
    }

    #[test]
    fn look_requires_pointer_lock() {
        let mut transform = Transform::default();
        let mut fps = FirstPersonController::direct();
        fps.handle_event(&PointerEvent::Move { dx: 10.0, dy: 0.0 }, &mut transform);
        assert_eq!(transform.rotation.y, 0.0);

        capture(&mut fps, &mut transform);
        fps.handle_event(&PointerEvent::Move { dx: 10.0, dy: 5.0 }, &mut transform);
        assert_eq!(transform.rotation.y, 10.0 * 0.0033);
        assert_eq!(transform.rotation.x, 5.0 * 0.0033);
    }

    #[test]
    fn direct_forward_moves_along_z() {
        let mut transform = Transform::default();
        let mut fps = FirstPersonController::direct();
        capture(&mut fps, &mut transform);
        fps.handle_event(&PointerEvent::KeyDown(Key::char('w')), &mut transform);
        fps.update(&mut transform, Duration::from_millis(16));
        assert_eq!(transform.position, Vec3::new(0.0, 0.0, 20.0));

        fps.handle_event(&PointerEvent::KeyUp(Key::char('w')), &mut transform);
        fps.handle_event(&PointerEvent::KeyDown(Key::char('a')), &mut transform);
        fps.update(&mut transform, Duration::from_millis(16));
        assert_eq!(transform.position, Vec3::new(20.0, 0.0, 20.0));
    }

    #[test]
    fn inertial_glides_to_rest() {
        let mut transform = Transform::default();
        let mut fps = FirstPersonController::inertial();
        capture(&mut fps, &mut transform);
        fps.handle_event(&PointerEvent::KeyDown(Key::char('w')), &mut transform);
        fps.update(&mut transform, Duration::from_millis(16));
        fps.handle_event(&PointerEvent::KeyUp(Key::char('w')), &mut transform);
        let after_press = transform.position.z;
        assert!(after_press > 0.0);

        for _ in 0..500 {
            fps.update(&mut transform, Duration::from_millis(16));
        }
        assert!(transform.position.z > after_press);
        assert!(fps.velocity().length() < 1e-9);
    }

    #[test]
    fn lock_releases_pointer() {
        let mut transform = Transform::default();
        let mut fps = FirstPersonController::direct();
        capture(&mut fps, &mut transform);
        fps.lock();
        assert!(!fps.base().pointer_locked());
        fps.handle_event(&PointerEvent::Move { dx: 10.0, dy: 0.0 }, &mut transform);
        assert_eq!(transform.rotation.y, 0.0);
    }
}

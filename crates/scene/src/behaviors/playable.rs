use std::any::Any;
use std::f32::consts::PI;
use std::time::Duration;

use glam::Vec3;
use viewport_input::Key;

use crate::behavior::{Behavior, UpdateContext};
use crate::object::SceneObject;

const GRAVITY: f32 = 0.01;
const RESISTANCE: f32 = 0.93;
const JUMP_COOLDOWN_MS: f32 = 400.0;

/// Keyboard/gamepad driven movement.
///
/// Input accumulates into `force`, which is damped every step and copied
/// into velocity. The movement basis is derived from the entity's yaw and
/// pitch so forward follows where it faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playable {
    pub speed: f32,
    pub jump_power: f32,
    /// Milliseconds since the last jump.
    pub jump_timer: f32,
    /// Reads input when set.
    pub player: bool,
    direction: Vec3,
}

impl Default for Playable {
    fn default() -> Self {
        Self {
            speed: 0.01,
            jump_power: 0.33,
            jump_timer: 0.0,
            player: true,
            direction: Vec3::ZERO,
        }
    }
}

impl Playable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_forward(&mut self, amount: f32) {
        self.direction.z = amount;
    }

    pub fn pan(&mut self, amount: f32) {
        self.direction.y = -amount;
    }

    pub fn strafe(&mut self, amount: f32) {
        self.direction.x = amount;
    }

    fn jump(&mut self, object: &mut SceneObject) {
        let Some(entity) = object.entity.as_mut() else {
            return;
        };
        if !entity.airborn && self.jump_timer > JUMP_COOLDOWN_MS {
            entity.force.y = self.jump_power;
            entity.airborn = true;
            self.jump_timer = 0.0;
        }
    }

    fn read_input(&mut self, object: &mut SceneObject, ctx: &UpdateContext<'_>) {
        let input = ctx.input;
        if input.pressed_any(&[Key::Char('a'), Key::Gamepad(14)]) {
            self.strafe(-self.speed);
        }
        if input.pressed_any(&[Key::Char('d'), Key::Gamepad(15)]) {
            self.strafe(self.speed);
        }
        if input.pressed_any(&[Key::Char('w'), Key::Gamepad(12)]) {
            self.move_forward(self.speed);
        }
        if input.pressed_any(&[Key::Char('s'), Key::Gamepad(13)]) {
            self.move_forward(-self.speed);
        }
        if input.pressed_any(&[Key::Space, Key::Gamepad(0)]) {
            self.jump(object);
        }
    }
}

fn boost(force: &mut Vec3) {
    force.y += 0.08;
    force.y *= 0.75;
    force.x *= 1.01;
    force.z *= 1.01;
}

impl Behavior for Playable {
    fn name(&self) -> &'static str {
        "playable"
    }

    fn on_create(&mut self, object: &mut SceneObject) {
        if let Some(entity) = object.entity.as_mut() {
            entity.force = Vec3::ZERO;
        }
        self.direction = Vec3::ZERO;
        self.jump_timer = 0.0;
    }

    fn on_update(&mut self, object: &mut SceneObject, ctx: &UpdateContext<'_>, dt: Duration) {
        self.jump_timer += dt.as_secs_f32() * 1000.0;
        if !self.player {
            return;
        }
        self.read_input(object, ctx);

        let rotation = object.transform.rotation;
        let pitch = rotation.x.tan().clamp(-1.0, 1.0);
        let inverse = Vec3::new((-rotation.y).sin(), pitch, (-rotation.y).cos());
        let facing = Vec3::new(rotation.y.sin(), pitch, rotation.y.cos());

        if self.direction.x < 0.0 {
            object.transform.rotation.y = PI;
            self.direction.x = -self.direction.x;
        } else if self.direction.x > 0.0 {
            object.transform.rotation.y = 0.0;
        }

        let Some(entity) = object.entity.as_mut() else {
            return;
        };
        if entity.airborn {
            self.direction.x *= RESISTANCE;
            self.direction.z *= RESISTANCE;
        }

        let d = self.direction;
        entity.force.x += d.z * inverse.x + d.x * facing.z;
        entity.force.y += d.z * inverse.y + d.y;
        entity.force.z += d.z * inverse.z + d.x * facing.x;
        entity.force.y -= GRAVITY;

        if ctx.input.pressed_any(&[Key::Char('q'), Key::Gamepad(3)]) {
            boost(&mut entity.force);
        }

        entity.velocity = entity.force;
        if let Some(ground) = entity.ground.take() {
            entity.velocity.x = entity.force.x + ground.velocity.x;
        }

        entity.force.x *= RESISTANCE;
        entity.force.z *= RESISTANCE;
        self.direction = Vec3::ZERO;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

use std::any::Any;
use std::time::Duration;

use glam::Vec2;

use crate::behavior::{Behavior, UpdateContext};
use crate::object::{ObjectId, SceneObject};

/// Steers an entity toward a target object with a dead zone.
///
/// With `invert` set the follower uses the camera convention and chases
/// `-target.position`.
#[derive(Debug, Clone, Copy)]
pub struct Follow {
    pub target: Option<ObjectId>,
    pub dead_zone: Vec2,
    pub gain: f32,
    pub invert: bool,
}

impl Default for Follow {
    fn default() -> Self {
        Self {
            target: None,
            dead_zone: Vec2::new(4.0, 3.0),
            gain: 0.05,
            invert: true,
        }
    }
}

impl Follow {
    pub fn new(target: ObjectId) -> Self {
        Self {
            target: Some(target),
            ..Default::default()
        }
    }

    pub fn follow(&mut self, target: ObjectId) {
        self.target = Some(target);
    }
}

fn dead(delta: f32, zone: f32) -> f32 {
    if delta - zone > 0.0 {
        delta - zone
    } else {
        (delta + zone).min(0.0)
    }
}

impl Behavior for Follow {
    fn name(&self) -> &'static str {
        "follow"
    }

    fn on_update(&mut self, object: &mut SceneObject, ctx: &UpdateContext<'_>, _dt: Duration) {
        let Some(target) = self.target.and_then(|id| ctx.position_of(id)) else {
            return;
        };
        let target = if self.invert { -target } else { target };
        let position = object.transform.position;
        let Some(entity) = object.entity.as_mut() else {
            return;
        };
        entity.velocity.x = dead(target.x - position.x, self.dead_zone.x) * self.gain;
        entity.velocity.y = dead(target.y - position.y, self.dead_zone.y) * self.gain;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use slotmap::{SecondaryMap, SlotMap};
    use viewport_input::InputState;

    use super::*;

    #[test]
    fn dead_zone() {
        assert_eq!(dead(5.0, 4.0), 1.0);
        assert_eq!(dead(-5.0, 4.0), -1.0);
        assert_eq!(dead(2.0, 4.0), 0.0);
        assert_eq!(dead(-2.0, 4.0), 0.0);
    }

    #[test]
    fn chases_inverted_target() {
        let mut ids: SlotMap<ObjectId, ()> = SlotMap::with_key();
        let target = ids.insert(());
        let mut positions = SecondaryMap::new();
        positions.insert(target, Vec3::new(-14.0, 0.0, 0.0));

        let mut camera = SceneObject::entity("entity_camera").with_behavior(Follow::new(target));
        let input = InputState::new();
        let ctx = UpdateContext::new(&input, &positions);
        camera.run_update(&ctx, Duration::from_millis(8));

        assert_eq!(camera.entity.as_ref().map(|e| e.velocity.x), Some(0.5));
        assert_eq!(camera.transform.position.x, 0.5);
    }

    #[test]
    fn missing_target_is_ignored() {
        let mut ids: SlotMap<ObjectId, ()> = SlotMap::with_key();
        let target = ids.insert(());
        let positions = SecondaryMap::new();
        let mut camera = SceneObject::entity("entity_camera").with_behavior(Follow::new(target));
        let input = InputState::new();
        camera.run_update(&UpdateContext::new(&input, &positions), Duration::from_millis(8));
        assert_eq!(camera.transform.position, Vec3::ZERO);
    }
}

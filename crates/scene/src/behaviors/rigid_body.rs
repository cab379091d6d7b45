use std::any::Any;
use std::time::Duration;

use crate::behavior::{Behavior, UpdateContext};
use crate::object::SceneObject;

const GRAVITY: f32 = -0.01;
const DAMPING: f32 = 0.98;

/// Heavy body falling under gravity with horizontal damping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RigidBody;

impl Behavior for RigidBody {
    fn name(&self) -> &'static str {
        "rigid_body"
    }

    fn on_create(&mut self, object: &mut SceneObject) {
        if let Some(entity) = object.entity.as_mut() {
            entity.weight = 3.0;
            entity.hovering = false;
        }
    }

    fn on_update(&mut self, object: &mut SceneObject, _ctx: &UpdateContext<'_>, _dt: Duration) {
        let Some(entity) = object.entity.as_mut() else {
            return;
        };
        let gravity = if entity.hovering { 0.0 } else { GRAVITY };
        entity.velocity.x *= DAMPING;
        entity.velocity.y += gravity;
        entity.velocity.z *= DAMPING;
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
    use slotmap::SecondaryMap;
    use viewport_input::InputState;

    use super::*;

    #[test]
    fn falls_and_damps() {
        let mut object = SceneObject::entity("entity").with_behavior(RigidBody);
        object.run_create();
        if let Some(entity) = object.entity.as_mut() {
            entity.velocity = Vec3::new(1.0, 0.0, 1.0);
        }
        let input = InputState::new();
        let positions = SecondaryMap::new();
        let ctx = UpdateContext::new(&input, &positions);
        object.run_update(&ctx, Duration::from_millis(8));

        let entity = object.entity.as_ref().map(|e| (e.velocity, e.weight));
        assert_eq!(entity, Some((Vec3::new(0.98, -0.01, 0.98), 3.0)));
    }

    #[test]
    fn hovering_ignores_gravity() {
        let mut object = SceneObject::entity("entity").with_behavior(RigidBody);
        object.run_create();
        if let Some(entity) = object.entity.as_mut() {
            entity.hovering = true;
        }
        let input = InputState::new();
        let positions = SecondaryMap::new();
        object.run_update(&UpdateContext::new(&input, &positions), Duration::from_millis(8));
        assert_eq!(object.transform.position, Vec3::ZERO);
    }
}

use std::any::Any;
use std::time::Duration;

use glam::Vec3;
use slotmap::SecondaryMap;
use viewport_input::InputState;

use crate::collision::{Bounds, Edge, Hitbox};
use crate::object::{ObjectId, SceneObject};

/// A composable behavior bundle attached to an entity.
///
/// Every hook is optional. Behavior state lives in the implementing type;
/// the entity is only reached through the `object` argument.
pub trait Behavior: Any {
    fn name(&self) -> &'static str;

    /// Called once when the owning object is added to a scene.
    fn on_create(&mut self, _object: &mut SceneObject) {}

    /// Called every simulation step before velocity is integrated.
    fn on_update(&mut self, _object: &mut SceneObject, _ctx: &UpdateContext<'_>, _dt: Duration) {}

    /// Called when one of the object's edges penetrates `other`.
    fn on_intersects(&mut self, _object: &mut SceneObject, _other: &CollisionBody, _edge: Edge) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Snapshot of the other party in a collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBody {
    pub id: ObjectId,
    pub position: Vec3,
    pub hitbox: Hitbox,
    pub velocity: Vec3,
}

impl CollisionBody {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.position, &self.hitbox)
    }
}

/// Read-only view of the world handed to `on_update`.
pub struct UpdateContext<'a> {
    pub input: &'a InputState,
    pub(crate) positions: &'a SecondaryMap<ObjectId, Vec3>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(input: &'a InputState, positions: &'a SecondaryMap<ObjectId, Vec3>) -> Self {
        Self { input, positions }
    }

    /// Local position of another object as of the start of this step.
    pub fn position_of(&self, id: ObjectId) -> Option<Vec3> {
        self.positions.get(id).copied()
    }
}

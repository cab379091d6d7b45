use std::any::Any;

use crate::behavior::{Behavior, CollisionBody};
use crate::collision::{Bounds, Edge};
use crate::object::SceneObject;

/// Positional collision response.
///
/// The response is an inelastic correction: the entity is snapped flush
/// against the edge it penetrated and its velocity on that axis is zeroed
/// (landing) or reflected scaled by `1 / weight`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collider {
    fixed: bool,
}

impl Collider {
    pub fn new() -> Self {
        Self { fixed: false }
    }

    /// Takes part in overlap tests but is never moved.
    pub fn fixed() -> Self {
        Self { fixed: true }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }
}

impl Behavior for Collider {
    fn name(&self) -> &'static str {
        "collider"
    }

    fn on_create(&mut self, object: &mut SceneObject) {
        if let Some(entity) = object.entity.as_mut() {
            entity.collider = true;
            entity.airborn = !self.fixed;
        }
    }

    fn on_intersects(&mut self, object: &mut SceneObject, other: &CollisionBody, edge: Edge) {
        if self.fixed {
            return;
        }
        let Some(hitbox) = object.hitbox else {
            return;
        };
        let Some(entity) = object.entity.as_mut() else {
            return;
        };
        if !entity.collider {
            return;
        }

        let position = &mut object.transform.position;
        let a = Bounds::new(*position, &hitbox);
        let b = other.bounds();

        let overlaps_x = a.overlaps_x(&b);
        let overlaps_y = a.overlaps_y(&b);

        let below = a.top - entity.velocity.y * 2.0 < b.bottom;
        let above = a.bottom - entity.velocity.y * 2.0 > b.top;

        let weight = if entity.weight > 0.0 { entity.weight } else { 10.0 };

        match edge {
            Edge::Right if !(below || above) => {
                if a.right > b.left && a.right < b.right && overlaps_y {
                    entity.velocity.x = -entity.velocity.x / weight;
                    position.x = b.left - hitbox.right;
                    entity.airborn = false;
                }
            }
            Edge::Left if !(below || above) => {
                if a.left < b.right && a.left > b.left && overlaps_y {
                    entity.velocity.x = -entity.velocity.x / weight;
                    position.x = b.right - hitbox.left;
                    entity.airborn = false;
                }
            }
            Edge::Top => {
                if a.top > b.bottom && a.top < b.top && overlaps_x {
                    entity.velocity.y = -entity.velocity.y / weight;
                    position.y = b.bottom - hitbox.top;
                }
            }
            Edge::Bottom => {
                if a.bottom < b.top && a.bottom > b.bottom && overlaps_x {
                    entity.velocity.y = 0.0;
                    entity.force.y = 0.0;
                    position.y = b.top - hitbox.bottom;
                    entity.airborn = false;
                    entity.ground = Some(*other);
                }
            }
            _ => {}
        }
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

    use super::*;
    use crate::collision::Hitbox;
    use crate::object::ObjectId;

    fn floor() -> CollisionBody {
        CollisionBody {
            id: ObjectId::default(),
            position: Vec3::ZERO,
            hitbox: Hitbox::from_array([1.0, 10.0, -1.0, -10.0, 2.0]),
            velocity: Vec3::new(0.5, 0.0, 0.0),
        }
    }

    fn falling(y: f32, vy: f32) -> SceneObject {
        let mut object = SceneObject::entity("entity")
            .with_position(Vec3::new(0.0, y, 0.0))
            .with_hitbox(Hitbox::from_array([1.0, 1.0, -1.0, -1.0, 1.0]))
            .with_behavior(Collider::new());
        object.run_create();
        if let Some(entity) = object.entity.as_mut() {
            entity.velocity.y = vy;
        }
        object
    }

    #[test]
    fn bottom_edge_rests_on_top() {
        let mut object = falling(1.75, -0.25);
        object.intersects(&floor(), Edge::Bottom);

        let bottom = object.transform.position.y + -1.0;
        assert_eq!(bottom, 1.0);
        let entity = object.entity.as_ref().map(|e| (e.velocity.y, e.airborn, e.ground.is_some()));
        assert_eq!(entity, Some((0.0, false, true)));
    }

    #[test]
    fn top_edge_reflects_scaled_by_weight() {
        let mut object = falling(-1.75, 0.5);
        if let Some(entity) = object.entity.as_mut() {
            entity.weight = 2.0;
        }
        object.intersects(&floor(), Edge::Top);
        assert_eq!(object.transform.position.y, -2.0);
        assert_eq!(object.entity.as_ref().map(|e| e.velocity.y), Some(-0.25));
    }

    fn wall() -> CollisionBody {
        CollisionBody {
            id: ObjectId::default(),
            position: Vec3::ZERO,
            hitbox: Hitbox::from_array([2.0, 1.0, -2.0, -1.0, 1.0]),
            velocity: Vec3::ZERO,
        }
    }

    fn sliding(x: f32, vx: f32) -> SceneObject {
        let mut object = falling(0.0, 0.0);
        object.transform.position.x = x;
        if let Some(entity) = object.entity.as_mut() {
            entity.velocity.x = vx;
            entity.weight = 2.0;
        }
        object
    }

    #[test]
    fn right_edge_stops_flush_against_wall() {
        let mut object = sliding(-1.75, 0.5);
        object.intersects(&wall(), Edge::Right);

        assert_eq!(object.transform.position.x, -2.0);
        let entity = object.entity.as_ref().map(|e| (e.velocity.x, e.airborn));
        assert_eq!(entity, Some((-0.25, false)));
    }

    #[test]
    fn left_edge_stops_flush_against_wall() {
        let mut object = sliding(1.75, -0.5);
        object.intersects(&wall(), Edge::Left);

        assert_eq!(object.transform.position.x, 2.0);
        assert_eq!(object.entity.as_ref().map(|e| e.velocity.x), Some(0.25));
    }

    #[test]
    fn side_edge_ignored_without_penetration() {
        let mut object = sliding(-3.0, 0.5);
        object.intersects(&wall(), Edge::Right);
        assert_eq!(object.transform.position.x, -3.0);
        assert_eq!(object.entity.as_ref().map(|e| e.velocity.x), Some(0.5));
    }

    #[test]
    fn side_skipped_when_landing() {
        let mut object = falling(1.75, -0.25);
        let before = object.transform.position;
        object.intersects(&floor(), Edge::Right);
        assert_eq!(object.transform.position, before);
    }

    #[test]
    fn fixed_never_moves() {
        let mut object = SceneObject::entity("prop_static")
            .with_position(Vec3::new(0.0, 1.75, 0.0))
            .with_hitbox(Hitbox::from_array([1.0, 1.0, -1.0, -1.0, 1.0]))
            .with_behavior(Collider::fixed());
        object.run_create();
        object.intersects(&floor(), Edge::Bottom);
        assert_eq!(object.transform.position.y, 1.75);
        assert_eq!(object.entity.as_ref().map(|e| e.intersections().len()), Some(1));
    }
}

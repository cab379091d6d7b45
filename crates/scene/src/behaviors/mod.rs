//! Built-in behaviors.

mod collider;
mod follow;
mod playable;
mod rigid_body;

pub use collider::Collider;
pub use follow::Follow;
pub use playable::Playable;
pub use rigid_body::RigidBody;

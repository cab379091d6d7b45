use crate::object::ObjectId;

/// Errors from scene operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("object {0:?} not found")]
    ObjectNotFound(ObjectId),
    #[error("unknown object type {0:?}")]
    UnknownType(String),
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    ParentCycle { child: ObjectId, parent: ObjectId },
    #[error("object {0:?} is not a camera")]
    NotACamera(ObjectId),
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

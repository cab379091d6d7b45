use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fingerprint::{Fingerprint, FingerprintBuilder};

/// Identity of a scene. Renderers drop their GPU caches when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a material, stable across attribute edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub Uuid);

impl MaterialId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::new()
    }
}

/// Local placement of a scene object.
///
/// `rotation` holds Euler angles in radians (applied X, then Y, then Z) and
/// pivots around `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub origin: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            origin: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the same scale factor on every axis.
    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vec3::splat(scale);
    }

    pub fn quat(&self) -> Quat {
        euler_quat(self.rotation)
    }

    /// Model matrix from this transform's own values.
    pub fn local_matrix(&self) -> Mat4 {
        self.matrix_at(self.position, self.rotation)
    }

    /// Model matrix using world-space `position` and `rotation` with this
    /// transform's origin and scale.
    ///
    /// `T(position) * T(origin) * R * S * T(-origin)`
    pub fn matrix_at(&self, position: Vec3, rotation: Vec3) -> Mat4 {
        Mat4::from_translation(position + self.origin)
            * Mat4::from_quat(euler_quat(rotation))
            * Mat4::from_scale(self.scale)
            * Mat4::from_translation(-self.origin)
    }

    /// Structural fingerprint of the local values.
    pub fn fingerprint(&self) -> Fingerprint {
        self.hash_into(FingerprintBuilder::new()).finish()
    }

    pub fn hash_into(&self, builder: FingerprintBuilder) -> FingerprintBuilder {
        builder
            .write_vec3(self.position)
            .write_vec3(self.rotation)
            .write_vec3(self.origin)
            .write_vec3(self.scale)
    }
}

/// Quaternion for XYZ Euler angles in radians.
pub fn euler_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_uniqueness() {
        assert_ne!(SceneId::new(), SceneId::new());
        assert_ne!(MaterialId::new(), MaterialId::new());
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.origin, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.local_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let p = t.local_matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn rotation_pivots_around_origin() {
        let mut t = Transform::default();
        t.origin = Vec3::new(1.0, 0.0, 0.0);
        t.rotation = Vec3::new(0.0, 0.0, std::f32::consts::PI);
        // The pivot itself does not move.
        let pivot = t.local_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(pivot.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
        // The local zero swings to the other side of the pivot.
        let p = t.local_matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn uniform_scale_sets_every_axis() {
        let mut t = Transform::default();
        t.set_uniform_scale(2.5);
        assert_eq!(t.scale, Vec3::splat(2.5));
    }

    #[test]
    fn fingerprint_tracks_every_component() {
        let base = Transform::default();
        let mut moved = base;
        moved.origin.y = 0.5;
        assert_eq!(base.fingerprint(), Transform::default().fingerprint());
        assert_ne!(base.fingerprint(), moved.fingerprint());
    }
}

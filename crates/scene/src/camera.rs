use glam::{Mat4, Vec2, Vec3};
use viewport_common::{Fingerprint, FingerprintBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Projection parameters and derived matrices of a camera object.
///
/// Camera transforms follow the view convention: `position` is the offset
/// applied to the world, so the eye sits at `-position` when `origin` is
/// zero. `origin` is applied after rotation, which turns `origin.z` into an
/// orbit distance.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub projection: Projection,
    /// Viewport size used for the aspect ratio, or the orthographic extent.
    pub sensor: Vec2,
    proj: Mat4,
    view: Mat4,
    model: Mat4,
    proj_view: Mat4,
    fingerprint: Option<Fingerprint>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            fov: 90.0,
            near: 0.1,
            far: 100.0,
            projection: Projection::Perspective,
            sensor: Vec2::new(1280.0, 720.0),
            proj: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            proj_view: Mat4::IDENTITY,
            fingerprint: None,
        }
    }
}

impl CameraState {
    pub fn perspective(fov: f32) -> Self {
        Self {
            fov,
            ..Default::default()
        }
    }

    /// Orthographic camera spanning `width` x `height` world units.
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic,
            sensor: Vec2::new(width, height),
            near,
            far,
            ..Default::default()
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.sensor.y > 0.0 {
            self.sensor.x / self.sensor.y
        } else {
            1.0
        }
    }

    pub fn set_sensor(&mut self, width: f32, height: f32) {
        self.sensor = Vec2::new(width, height);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fov.to_radians(), self.aspect(), self.near, self.far)
            }
            Projection::Orthographic => {
                let (w, h) = (self.sensor.x / 2.0, self.sensor.y / 2.0);
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        }
    }

    /// `T(origin) * Rx * Ry * Rz * T(position)`
    pub fn view_matrix_for(position: Vec3, rotation: Vec3, origin: Vec3) -> Mat4 {
        Mat4::from_translation(origin)
            * Mat4::from_rotation_x(rotation.x)
            * Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_z(rotation.z)
            * Mat4::from_translation(position)
    }

    /// Recompute matrices unless `placement` and the projection parameters
    /// are unchanged. Returns whether anything was recomputed.
    pub fn refresh(&mut self, position: Vec3, rotation: Vec3, origin: Vec3, placement: Fingerprint) -> bool {
        let fingerprint = FingerprintBuilder::new()
            .write_u64(placement.0)
            .write_f32(self.fov)
            .write_f32(self.near)
            .write_f32(self.far)
            .write_u64(self.projection as u64)
            .write_f32(self.sensor.x)
            .write_f32(self.sensor.y)
            .finish();
        if self.fingerprint == Some(fingerprint) {
            return false;
        }
        self.proj = self.projection_matrix();
        self.view = Self::view_matrix_for(position, rotation, origin);
        self.model = self.view.inverse();
        self.proj_view = self.proj * self.view;
        self.fingerprint = Some(fingerprint);
        true
    }

    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn proj_view(&self) -> Mat4 {
        self.proj_view
    }

    /// World-space eye position.
    pub fn eye(&self) -> Vec3 {
        self.model.transform_point3(Vec3::ZERO)
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }
}

/// Light parameters of a directional light camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub color: Vec3,
}

impl Default for LightState {
    fn default() -> Self {
        Self { color: Vec3::ONE }
    }
}

/// Camera settings of a directional light: orthographic 32x32, near 1, far 1000.
pub fn light_camera() -> CameraState {
    CameraState::orthographic(32.0, 32.0, 1.0, 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cam = CameraState::default();
        assert_eq!(cam.fov, 90.0);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 100.0);
        assert_eq!(cam.projection, Projection::Perspective);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn refresh_is_memoized() {
        let mut cam = CameraState::default();
        let fp = Fingerprint(1);
        assert!(cam.refresh(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, fp));
        assert!(!cam.refresh(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, fp));
        cam.fov = 60.0;
        assert!(cam.refresh(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, fp));
    }

    #[test]
    fn eye_is_negated_position() {
        let mut cam = CameraState::default();
        cam.refresh(Vec3::new(0.0, -2.0, 5.0), Vec3::ZERO, Vec3::ZERO, Fingerprint(9));
        assert!(cam.eye().abs_diff_eq(Vec3::new(0.0, 2.0, -5.0), 1e-5));
    }

    #[test]
    fn proj_view_is_product() {
        let mut cam = CameraState::default();
        cam.refresh(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.3, 0.2, 0.0), Vec3::ZERO, Fingerprint(3));
        assert!(cam.proj_view().abs_diff_eq(cam.proj() * cam.view(), 1e-6));
        assert!((cam.model() * cam.view()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn orthographic_spans_sensor() {
        let cam = light_camera();
        let p = cam.projection_matrix().project_point3(Vec3::new(16.0, 16.0, -2.0));
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }
}

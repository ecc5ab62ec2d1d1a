use glam::{Mat4, Vec3};

use crate::settings::CameraSettings;

/// Perspective camera looking at a target point.
///
/// The projection matrix is cached; anything that changes it goes through
/// [`set_aspect`](Self::set_aspect) or
/// [`update_projection_matrix`](Self::update_projection_matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view, in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub position: Vec3,
    pub target: Vec3,

    projection_matrix: Mat4,
}

impl PerspectiveCamera {
    #[must_use]
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    /// Camera at the configured position, looking at the origin.
    #[must_use]
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        let mut cam = Self::new(settings.fov, aspect, settings.near, settings.far);
        cam.position = settings.position();
        cam.target = Vec3::ZERO;
        cam
    }

    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh targets the wgpu [0, 1] depth range
        self.projection_matrix =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect.max(f32::EPSILON), self.near, self.far);
    }

    /// Sets the aspect ratio and recomputes the projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }

    /// Maps clip-space positions on the far plane to world-space view
    /// directions. The translation of the view is dropped, so the
    /// background stays at infinity while the camera orbits.
    #[must_use]
    pub fn background_matrix(&self) -> Mat4 {
        let forward = self.target - self.position;
        let forward = if forward.length_squared() > f32::EPSILON {
            forward
        } else {
            Vec3::NEG_Z
        };
        let rotation = Mat4::look_to_rh(Vec3::ZERO, forward, Vec3::Y);
        (self.projection_matrix * rotation).inverse()
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_aspect_updates_projection() {
        let mut cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let before = cam.projection_matrix();
        cam.set_aspect(2.0);
        assert_ne!(before, cam.projection_matrix());
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(75f32.to_radians(), 2.0, 0.1, 100.0)
        );
    }

    #[test]
    fn background_center_ray_follows_view_direction() {
        let mut cam = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam.target = Vec3::ZERO;

        let far = cam.background_matrix() * glam::Vec4::new(0.0, 0.0, 1.0, 1.0);
        let dir = (far.truncate() / far.w).normalize();
        assert!(dir.abs_diff_eq(Vec3::NEG_Z, 1e-4));

        cam.position = Vec3::new(5.0, 0.0, 0.0);
        let far = cam.background_matrix() * glam::Vec4::new(0.0, 0.0, 1.0, 1.0);
        let dir = (far.truncate() / far.w).normalize();
        assert!(dir.abs_diff_eq(Vec3::NEG_X, 1e-4));
    }
}

use glam::{Vec2, Vec3};

use crate::app::input::{Input, MouseButton};
use crate::scene::PerspectiveCamera;
use crate::settings::ControlSettings;

/// Orbit camera controller with damping and distance limits.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
}

impl OrbitControls {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            enable_pan: true,
            min_distance: 1.0,
            max_distance: 1000.0,

            center,
            radius,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Controls orbiting `center`, starting from the camera's current position.
    #[must_use]
    pub fn from_settings(settings: &ControlSettings, camera: &PerspectiveCamera, center: Vec3) -> Self {
        let offset = camera.position - center;
        let radius = offset.length().max(f32::EPSILON);

        let mut controls = Self::new(center, radius);
        controls.rotate_speed = settings.rotate_speed;
        controls.zoom_speed = settings.zoom_speed;
        controls.damping_factor = settings.damping_factor;
        controls.enable_damping = settings.enable_damping;
        controls.enable_pan = settings.enable_pan;
        controls.min_distance = settings.min_distance;
        controls.max_distance = settings.max_distance.max(settings.min_distance);
        controls.theta = offset.x.atan2(offset.z);
        controls.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        controls.radius = radius.clamp(controls.min_distance, controls.max_distance);
        controls
    }

    pub fn update(&mut self, camera: &mut PerspectiveCamera, input: &Input, dt: f32) {
        let screen_height = input.screen_size().y.max(1.0);

        if input.mouse_button(MouseButton::Left) {
            let rotate_per_pixel = 2.0 * std::f32::consts::PI / screen_height;
            self.rotate_delta -= input.mouse_delta() * rotate_per_pixel * self.rotate_speed;
        }

        if self.enable_damping {
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            let delta_apply = self.rotate_delta * (1.0 - retention);

            self.theta += delta_apply.x;
            self.phi += delta_apply.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        const EPS: f32 = 0.0001;
        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(scroll.abs());
            if scroll > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
        }
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);

        let offset = self.offset_direction();

        if self.enable_pan && input.mouse_button(MouseButton::Right) {
            let half_fov = camera.fov.to_radians() / 2.0;
            let target_world_height = 2.0 * self.radius * half_fov.tan();
            let pixels_to_world_ratio = target_world_height / screen_height;

            let forward = -offset;
            let right = forward.cross(Vec3::Y).normalize();
            let up = right.cross(forward).normalize();
            let delta = input.mouse_delta();

            self.center += (right * -delta.x + up * delta.y) * pixels_to_world_ratio * self.pan_speed;
        }

        camera.position = self.center + offset * self.radius;
        camera.look_at(self.center);
    }

    fn offset_direction(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::ButtonState;
    use crate::settings::CameraSettings;

    #[test]
    fn starts_at_camera_position() {
        let mut camera = PerspectiveCamera::from_settings(&CameraSettings::default(), 1.0);
        let mut controls = OrbitControls::from_settings(&ControlSettings::default(), &camera, Vec3::ZERO);
        controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
        assert!(camera.position.distance(Vec3::new(4.0, 1.0, -4.0)) < 1e-3);
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut camera = PerspectiveCamera::from_settings(&CameraSettings::default(), 1.0);
        let mut controls = OrbitControls::from_settings(&ControlSettings::default(), &camera, Vec3::ZERO);
        let mut input = Input::new();
        for _ in 0..100 {
            input.inject_scroll(0.0, 10.0);
            controls.update(&mut camera, &input, 1.0 / 60.0);
            input.end_frame();
        }
        assert!((camera.position.length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn pan_is_ignored_when_disabled() {
        let mut camera = PerspectiveCamera::from_settings(&CameraSettings::default(), 1.0);
        let mut controls = OrbitControls::from_settings(&ControlSettings::default(), &camera, Vec3::ZERO);
        let mut input = Input::new();
        input.inject_resize(800, 600);
        input.inject_mouse_button(MouseButton::Right, ButtonState::Pressed);
        input.inject_mouse_position(10.0, 10.0);
        input.inject_mouse_position(60.0, 40.0);
        controls.update(&mut camera, &input, 1.0 / 60.0);
        assert_eq!(controls.center, Vec3::ZERO);
    }
}

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::math::rotation_component;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Body axes. They turn with the body, never with view pitch.
    pub pan_axis: Vec3,
    pub tilt_axis: Vec3,
    /// Heading only; movement input is rotated by this so it stays level.
    pub orientation_h: Quat,
    /// Heading then pitch.
    pub orientation: Quat,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
            velocity: Vec3::ZERO,
            pan_axis: Vec3::Y,
            tilt_axis: Vec3::X,
            orientation_h: Quat::IDENTITY,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Player {
    /// Moves the whole body through `m`: position as a point, velocity as a
    /// direction, and both orientations by the rotation part of `m`.
    pub fn transform(&mut self, m: &Mat4) {
        self.position = m.transform_point3(self.position);
        self.velocity = m.transform_vector3(self.velocity);

        let rotation = rotation_component(m);
        self.orientation = (rotation * self.orientation).normalize();
        self.orientation_h = (rotation * self.orientation_h).normalize();
    }

    /// Turns the view by a pointer delta given in normalized window units.
    pub fn pan_view(&mut self, delta: Vec2, fov_degrees: f32, sensitivity: f32) {
        let theta = delta * fov_degrees * sensitivity;

        let turn_v = Quat::from_axis_angle(self.tilt_axis, theta.y.to_radians());
        let turn_h = Quat::from_axis_angle(self.pan_axis, (-theta.x).to_radians());

        self.orientation_h = (turn_h * self.orientation_h).normalize();
        self.orientation = (turn_h * self.orientation * turn_v).normalize();
    }

    pub fn heading_rotate(&self, v: Vec3) -> Vec3 {
        self.orientation_h * v
    }

    /// Inverse of the body's world transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.orientation.conjugate()) * Mat4::from_translation(-self.position)
    }
}

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec3};

use crate::error::GeometryError;

pub const NEAR_ZERO_EPSILON: f32 = 1.0e-6;

/// Slack allowed on unit length and perpendicularity of authored directions.
pub const DIRECTION_TOLERANCE: f32 = 1.0e-4;

pub fn near_zero(v: Vec3) -> bool {
    v.length_squared() <= NEAR_ZERO_EPSILON * NEAR_ZERO_EPSILON
}

/// Minimal rotation taking unit vector `from` onto unit vector `to`.
///
/// Antiparallel inputs turn half a revolution about the first world axis that
/// is not parallel to `from`.
pub fn rotation_between(from: Vec3, to: Vec3) -> Result<Mat4, GeometryError> {
    if near_zero(from) {
        return Err(GeometryError::DegenerateNormal { normal: from });
    }

    let axis = from.cross(to);
    let dot = from.dot(to);
    if !near_zero(axis) {
        let angle = dot.clamp(-1.0, 1.0).acos();
        return Ok(Mat4::from_axis_angle(axis.normalize(), angle));
    }

    if dot < 0.0 {
        for basis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let cross = from.cross(basis);
            if !near_zero(cross) {
                return Ok(Mat4::from_axis_angle(cross.normalize(), PI));
            }
        }
        return Err(GeometryError::DegenerateNormal { normal: from });
    }

    Ok(Mat4::IDENTITY)
}

/// Rotation part of an affine transform, with any per-axis scale removed.
pub fn rotation_component(m: &Mat4) -> Quat {
    let (_, rotation, _) = m.to_scale_rotation_translation();
    rotation.normalize()
}

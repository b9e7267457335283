use glam::{Mat4, Vec3};

use crate::error::GeometryError;
use crate::math::rotation_between;
use crate::quad::Quad;

/// Everything derived from one pair of quads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalTransforms {
    /// Space around quad A re-expressed around quad B.
    pub a_to_b: Mat4,
    pub b_to_a: Mat4,
    /// Quad A's canonical frame: centered at the origin, facing +Z, in-plane
    /// axis along +X, unit half extents.
    pub canon_a: Mat4,
    pub canon_b: Mat4,
}

/// Maps world space near `quad` into its canonical unit frame.
pub fn canonicalize(quad: &Quad) -> Result<Mat4, GeometryError> {
    quad.validate()?;

    let translate = Mat4::from_translation(-quad.center);
    let face_z = rotation_between(quad.normal, Vec3::Z)?;
    let in_plane = face_z.transform_vector3(quad.plane_v).normalize();
    let align_x = rotation_between(in_plane, Vec3::X)?;
    let scale = Mat4::from_scale(quad.scale.recip());

    Ok(scale * align_x * face_z * translate)
}

pub fn solve(a: &Quad, b: &Quad) -> Result<PortalTransforms, GeometryError> {
    let canon_a = canonicalize(a)?;
    let canon_b = canonicalize(b)?;

    Ok(PortalTransforms {
        a_to_b: canon_b.inverse() * canon_a,
        b_to_a: canon_a.inverse() * canon_b,
        canon_a,
        canon_b,
    })
}

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::error::GeometryError;
use crate::quad::Quad;
use crate::transform::solve;

/// One side of a linked portal pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    /// The visible surface, in the scene it sits in.
    pub event_horizon: Quad,
    /// Brings the space in front of the exit into the space in front of
    /// `event_horizon`. The renderer warps its camera by this; anything that
    /// crosses the horizon moves by its inverse.
    pub transform: Mat4,
    /// Canonical frame of `event_horizon`. Crossings are tested here and the
    /// shader clips against its z = 0 plane.
    pub portal_view: Mat4,
}

impl Portal {
    /// Builds the portal on `entry` leading to `exit`.
    ///
    /// The exit is turned half a revolution about its own up axis first, so
    /// walking forward into the entry keeps going forward out of the exit
    /// instead of coming back out mirrored.
    pub fn link(entry: &Quad, exit: &Quad) -> Result<Self, GeometryError> {
        exit.validate()?;
        let flip = Mat4::from_axis_angle(exit.up().normalize(), PI);
        let facing = exit.apply(&flip);

        let solved = solve(entry, &facing)?;
        Ok(Self {
            event_horizon: *entry,
            transform: solved.b_to_a,
            portal_view: solved.canon_a,
        })
    }

    /// Both directions of a two-way portal between `a` and `b`.
    pub fn pair(a: &Quad, b: &Quad) -> Result<[Self; 2], GeometryError> {
        Ok([Self::link(a, b)?, Self::link(b, a)?])
    }

    /// Fraction of `displacement` at which a body at `position` passes through
    /// the horizon from behind, or `None` if it does not cross this tick.
    pub fn crossing_time(&self, position: Vec3, displacement: Vec3) -> Option<f32> {
        let pos = self.portal_view.transform_point3(position);
        let v = self.portal_view.transform_vector3(displacement);
        if !(pos.z < 0.0 && v.z > 0.0) {
            return None;
        }

        let t = -pos.z / v.z;
        let hit = pos + v * t;
        let inside = hit.x.abs() <= 1.0 && hit.y.abs() <= 1.0;
        (inside && t > 0.0 && t <= 1.0).then_some(t)
    }
}

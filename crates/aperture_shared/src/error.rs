use std::fmt;

use glam::Vec3;

/// Authored geometry that cannot produce a usable portal transform.
///
/// These are never recovered from at runtime: any matrix built from such a
/// quad would silently fill with NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    DegenerateNormal { normal: Vec3 },
    DegenerateAxis { axis: Vec3 },
    ZeroScale { scale: Vec3 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateNormal { normal } => {
                write!(f, "normal {normal} is not a usable unit direction")
            }
            Self::DegenerateAxis { axis } => {
                write!(f, "in-plane axis {axis} is not a unit vector perpendicular to the quad normal")
            }
            Self::ZeroScale { scale } => {
                write!(f, "quad scale {scale} has a zero or non-finite component")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Tunables that parse but cannot drive the simulation or projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantsError {
    NearPlane { near: f32 },
    FarPlane { near: f32, far: f32 },
    FieldOfView { fov: f32 },
    PortalDepth { depth: u32, max: u32 },
}

impl fmt::Display for ConstantsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearPlane { near } => {
                write!(f, "player_view_near must be positive, got {near}")
            }
            Self::FarPlane { near, far } => {
                write!(f, "player_view_far ({far}) must lie beyond player_view_near ({near})")
            }
            Self::FieldOfView { fov } => {
                write!(f, "player_fov must be between 0 and 180 degrees, got {fov}")
            }
            Self::PortalDepth { depth, max } => {
                write!(f, "portal_depth {depth} exceeds the stencil limit of {max}")
            }
        }
    }
}

impl std::error::Error for ConstantsError {}

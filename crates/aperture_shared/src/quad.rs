use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::error::GeometryError;
use crate::math::{DIRECTION_TOLERANCE, NEAR_ZERO_EPSILON};

/// Fraction of `scale.z` the front marker sticks out along the normal.
pub const NOSE_LENGTH: f32 = 0.2;

pub const QUAD_VERTEX_COUNT: usize = 6;

/// Triangle strip over the four corners. Wound so the front face looks down
/// `-normal`, the side a portal is entered from.
pub const QUAD_STRIP_ELEMENTS: [u16; 4] = [0, 1, 2, 3];

/// Outline, both diagonals and the nose marker.
pub const QUAD_LINE_ELEMENTS: [u16; 14] = [0, 1, 1, 3, 3, 2, 2, 0, 0, 3, 1, 2, 4, 5];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadMesh {
    pub positions: [f32; QUAD_VERTEX_COUNT * 3],
    pub normals: [f32; QUAD_VERTEX_COUNT * 3],
}

impl QuadMesh {
    pub fn vertices(&self) -> [MeshVertex; QUAD_VERTEX_COUNT] {
        std::array::from_fn(|i| MeshVertex {
            position: [
                self.positions[i * 3],
                self.positions[i * 3 + 1],
                self.positions[i * 3 + 2],
            ],
            normal: [
                self.normals[i * 3],
                self.normals[i * 3 + 1],
                self.normals[i * 3 + 2],
            ],
        })
    }
}

/// Planar rectangle: `scale.x`/`scale.y` are half extents along `plane_v` and
/// `normal x plane_v`, `scale.z` sizes the nose marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub center: Vec3,
    pub normal: Vec3,
    pub plane_v: Vec3,
    pub scale: Vec3,
}

impl Quad {
    pub fn new(center: Vec3, normal: Vec3, plane_v: Vec3, scale: Vec3) -> Self {
        Self {
            center,
            normal,
            plane_v,
            scale,
        }
    }

    pub fn up(&self) -> Vec3 {
        self.normal.cross(self.plane_v)
    }

    /// Normal and in-plane axis must be perpendicular unit vectors and every
    /// scale component non-zero.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !is_unit(self.normal) {
            return Err(GeometryError::DegenerateNormal {
                normal: self.normal,
            });
        }
        if !is_unit(self.plane_v) || self.normal.dot(self.plane_v).abs() > DIRECTION_TOLERANCE {
            return Err(GeometryError::DegenerateAxis { axis: self.plane_v });
        }
        if !self.scale.is_finite() || self.scale.abs().min_element() <= NEAR_ZERO_EPSILON {
            return Err(GeometryError::ZeroScale { scale: self.scale });
        }
        Ok(())
    }

    pub fn mesh(&self) -> QuadMesh {
        let right = self.plane_v * self.scale.x;
        let up = self.up() * self.scale.y;
        let corners = [
            self.center - right + up,
            self.center + right + up,
            self.center - right - up,
            self.center + right - up,
            self.center,
            self.center + self.normal * (self.scale.z * NOSE_LENGTH),
        ];

        let mut positions = [0.0; QUAD_VERTEX_COUNT * 3];
        let mut normals = [0.0; QUAD_VERTEX_COUNT * 3];
        for (i, corner) in corners.iter().enumerate() {
            positions[i * 3..i * 3 + 3].copy_from_slice(&corner.to_array());
            normals[i * 3..i * 3 + 3].copy_from_slice(&self.normal.to_array());
        }

        QuadMesh { positions, normals }
    }

    /// Reorients the quad in place: only the direction fields go through the
    /// linear part of `transform`; center and scale are kept.
    pub fn apply(&self, transform: &Mat4) -> Self {
        Self {
            center: self.center,
            normal: transform.transform_vector3(self.normal),
            plane_v: transform.transform_vector3(self.plane_v),
            scale: self.scale,
        }
    }
}

fn is_unit(v: Vec3) -> bool {
    v.is_finite() && (v.length() - 1.0).abs() <= DIRECTION_TOLERANCE
}

use glam::{Mat4, Vec4};

use crate::scene::{DrawElements, Geometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Lit scene geometry, clipped against the portal plane when enabled.
    Scene,
    /// Flat backdrop drawn at a fixed depth.
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Projection,
    CameraView,
    WorldView,
    PortalView,
    Inception,
    Elapsed,
    Glow,
    FillDepth,
    FillColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Float(f32),
    Vec4(Vec4),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    /// Increment where the depth test passes.
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    LessEqual,
    Always,
}

/// Immediate-mode rasterizer with a single shared depth/stencil buffer.
///
/// The stencil test always compares EQUAL against the reference level.
pub trait RenderBackend {
    fn clear(&mut self, color: Vec4);
    fn bind_program(&mut self, program: ProgramKind);
    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue);
    fn set_stencil_test(&mut self, enabled: bool);
    fn set_stencil_func(&mut self, reference: u32);
    fn set_stencil_op(&mut self, op: StencilOp);
    fn set_color_write(&mut self, enabled: bool);
    fn set_depth_test(&mut self, compare: DepthCompare);
    fn disable_depth_test(&mut self);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_clip_plane(&mut self, enabled: bool);
    fn set_face_culling(&mut self, enabled: bool);
    fn draw_indexed(&mut self, geometry: &Geometry, elements: &DrawElements);
}

use glam::{Mat4, Vec4};
use rustc_hash::FxHashSet;

use super::backend::{DepthCompare, ProgramKind, RenderBackend, StencilOp, Uniform, UniformValue};
use super::context::{RasterFlags, RasterState};
use crate::scene::{DrawElements, Geometry, Primitive};

#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub geometry: String,
    pub primitive: Primitive,
    pub index_count: usize,
    pub program: Option<ProgramKind>,
    pub state: RasterState,
    pub world_view: Mat4,
    pub glow: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Clear(Vec4),
    BindProgram(ProgramKind),
    SetUniform(Uniform, UniformValue),
    StencilTest(bool),
    StencilFunc(u32),
    StencilOp(StencilOp),
    ColorWrite(bool),
    DepthTest(Option<DepthCompare>),
    DepthWrite(bool),
    ClipPlane(bool),
    FaceCulling(bool),
    Draw(DrawRecord),
}

/// Backend that only writes down what it was asked to do.
///
/// Draw records carry the raster state, program, world view and glow in
/// effect at the time of the call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<RenderCommand>,
    state: RasterState,
    program: Option<ProgramKind>,
    world_view: Mat4,
    glow: f32,
    uploaded: FxHashSet<String>,
    uploaded_bytes: usize,
}

impl RecordingBackend {
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> + '_ {
        self.commands.iter().filter_map(|command| match command {
            RenderCommand::Draw(record) => Some(record),
            _ => None,
        })
    }

    pub fn state(&self) -> RasterState {
        self.state
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    pub fn clear_log(&mut self) {
        self.commands.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn clear(&mut self, color: Vec4) {
        self.commands.push(RenderCommand::Clear(color));
    }

    fn bind_program(&mut self, program: ProgramKind) {
        self.program = Some(program);
        self.commands.push(RenderCommand::BindProgram(program));
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) {
        match (uniform, value) {
            (Uniform::WorldView, UniformValue::Mat4(m)) => self.world_view = m,
            (Uniform::Glow, UniformValue::Float(glow)) => self.glow = glow,
            _ => {}
        }
        self.commands.push(RenderCommand::SetUniform(uniform, value));
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.state.flags.set(RasterFlags::STENCIL_TEST, enabled);
        self.commands.push(RenderCommand::StencilTest(enabled));
    }

    fn set_stencil_func(&mut self, reference: u32) {
        self.state.stencil_ref = reference;
        self.commands.push(RenderCommand::StencilFunc(reference));
    }

    fn set_stencil_op(&mut self, op: StencilOp) {
        self.state.stencil_op = op;
        self.commands.push(RenderCommand::StencilOp(op));
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.state.flags.set(RasterFlags::COLOR_WRITE, enabled);
        self.commands.push(RenderCommand::ColorWrite(enabled));
    }

    fn set_depth_test(&mut self, compare: DepthCompare) {
        self.state.flags.insert(RasterFlags::DEPTH_TEST);
        self.state.depth_compare = compare;
        self.commands.push(RenderCommand::DepthTest(Some(compare)));
    }

    fn disable_depth_test(&mut self) {
        self.state.flags.remove(RasterFlags::DEPTH_TEST);
        self.commands.push(RenderCommand::DepthTest(None));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.flags.set(RasterFlags::DEPTH_WRITE, enabled);
        self.commands.push(RenderCommand::DepthWrite(enabled));
    }

    fn set_clip_plane(&mut self, enabled: bool) {
        self.state.flags.set(RasterFlags::CLIP_PLANE, enabled);
        self.commands.push(RenderCommand::ClipPlane(enabled));
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.state.flags.set(RasterFlags::FACE_CULL, enabled);
        self.commands.push(RenderCommand::FaceCulling(enabled));
    }

    fn draw_indexed(&mut self, geometry: &Geometry, elements: &DrawElements) {
        if self.uploaded.insert(geometry.name.clone()) {
            self.uploaded_bytes += geometry.vertex_bytes().len();
        }
        self.commands.push(RenderCommand::Draw(DrawRecord {
            geometry: geometry.name.clone(),
            primitive: elements.primitive,
            index_count: elements.indices.len(),
            program: self.program,
            state: self.state,
            world_view: self.world_view,
            glow: self.glow,
        }));
    }
}

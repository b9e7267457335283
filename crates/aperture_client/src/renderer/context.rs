use std::ops::{Deref, DerefMut};

use bitflags::bitflags;
use glam::Vec4;

use super::backend::{DepthCompare, ProgramKind, RenderBackend, StencilOp, Uniform, UniformValue};
use crate::scene::{DrawElements, Geometry};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RasterFlags: u8 {
        const STENCIL_TEST = 1 << 0;
        const COLOR_WRITE = 1 << 1;
        const DEPTH_TEST = 1 << 2;
        const DEPTH_WRITE = 1 << 3;
        const CLIP_PLANE = 1 << 4;
        const FACE_CULL = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub flags: RasterFlags,
    pub stencil_ref: u32,
    pub stencil_op: StencilOp,
    pub depth_compare: DepthCompare,
}

impl RasterState {
    /// What every frame starts from and must be returned to.
    pub const BASELINE: Self = Self {
        flags: RasterFlags::COLOR_WRITE
            .union(RasterFlags::DEPTH_TEST)
            .union(RasterFlags::DEPTH_WRITE),
        stencil_ref: 0,
        stencil_op: StencilOp::Keep,
        depth_compare: DepthCompare::LessEqual,
    };
}

impl Default for RasterState {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Owns the backend and shadows its raster state so that only real changes
/// reach it.
pub struct RenderContext<B: RenderBackend> {
    backend: B,
    state: RasterState,
    program: Option<ProgramKind>,
    draw_calls: u32,
}

impl<B: RenderBackend> RenderContext<B> {
    pub fn new(mut backend: B) -> Self {
        let state = RasterState::BASELINE;
        backend.set_stencil_test(false);
        backend.set_stencil_func(state.stencil_ref);
        backend.set_stencil_op(state.stencil_op);
        backend.set_color_write(true);
        backend.set_depth_test(state.depth_compare);
        backend.set_depth_write(true);
        backend.set_clip_plane(false);
        backend.set_face_culling(false);

        Self {
            backend,
            state,
            program: None,
            draw_calls: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn state(&self) -> RasterState {
        self.state
    }

    pub fn program(&self) -> Option<ProgramKind> {
        self.program
    }

    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    /// Starts a frame. The returned guard puts the baseline raster state back
    /// when it goes out of scope.
    pub fn frame(&mut self) -> FrameGuard<'_, B> {
        self.draw_calls = 0;
        FrameGuard { ctx: self }
    }

    pub fn clear(&mut self, color: Vec4) -> &mut Self {
        self.backend.clear(color);
        self
    }

    pub fn use_program(&mut self, program: ProgramKind) -> &mut Self {
        if self.program != Some(program) {
            self.backend.bind_program(program);
            self.program = Some(program);
        }
        self
    }

    pub fn uniform(&mut self, uniform: Uniform, value: UniformValue) -> &mut Self {
        self.backend.set_uniform(uniform, value);
        self
    }

    /// Enables the stencil test, passing only pixels at `level`.
    pub fn stencil_mask(&mut self, level: u32) -> &mut Self {
        self.set_flag(RasterFlags::STENCIL_TEST, true);
        if self.state.stencil_ref != level {
            self.backend.set_stencil_func(level);
            self.state.stencil_ref = level;
        }
        self
    }

    pub fn stencil_off(&mut self) -> &mut Self {
        self.set_flag(RasterFlags::STENCIL_TEST, false);
        self
    }

    pub fn stencil_op(&mut self, op: StencilOp) -> &mut Self {
        if self.state.stencil_op != op {
            self.backend.set_stencil_op(op);
            self.state.stencil_op = op;
        }
        self
    }

    pub fn color_write(&mut self, enabled: bool) -> &mut Self {
        self.set_flag(RasterFlags::COLOR_WRITE, enabled);
        self
    }

    /// Depth test with `compare`, depth writes on.
    pub fn depth(&mut self, compare: DepthCompare) -> &mut Self {
        self.set_flag(RasterFlags::DEPTH_TEST, true);
        self.set_flag(RasterFlags::DEPTH_WRITE, true);
        if self.state.depth_compare != compare {
            self.backend.set_depth_test(compare);
            self.state.depth_compare = compare;
        }
        self
    }

    /// No depth test and no depth writes.
    pub fn depth_off(&mut self) -> &mut Self {
        self.set_flag(RasterFlags::DEPTH_TEST, false);
        self.set_flag(RasterFlags::DEPTH_WRITE, false);
        self
    }

    pub fn clip_plane(&mut self, enabled: bool) -> &mut Self {
        self.set_flag(RasterFlags::CLIP_PLANE, enabled);
        self
    }

    pub fn face_culling(&mut self, enabled: bool) -> &mut Self {
        self.set_flag(RasterFlags::FACE_CULL, enabled);
        self
    }

    pub fn draw(&mut self, geometry: &Geometry, elements: &DrawElements) {
        self.backend.draw_indexed(geometry, elements);
        self.draw_calls += 1;
    }

    pub fn restore_baseline(&mut self) {
        self.stencil_off()
            .stencil_op(StencilOp::Keep)
            .color_write(true)
            .depth(DepthCompare::LessEqual)
            .clip_plane(false)
            .face_culling(false);
    }

    fn set_flag(&mut self, flag: RasterFlags, enabled: bool) {
        if self.state.flags.contains(flag) == enabled {
            return;
        }
        self.state.flags.set(flag, enabled);

        if flag == RasterFlags::STENCIL_TEST {
            self.backend.set_stencil_test(enabled);
        } else if flag == RasterFlags::COLOR_WRITE {
            self.backend.set_color_write(enabled);
        } else if flag == RasterFlags::DEPTH_TEST {
            if enabled {
                self.backend.set_depth_test(self.state.depth_compare);
            } else {
                self.backend.disable_depth_test();
            }
        } else if flag == RasterFlags::DEPTH_WRITE {
            self.backend.set_depth_write(enabled);
        } else if flag == RasterFlags::CLIP_PLANE {
            self.backend.set_clip_plane(enabled);
        } else if flag == RasterFlags::FACE_CULL {
            self.backend.set_face_culling(enabled);
        }
    }
}

pub struct FrameGuard<'a, B: RenderBackend> {
    ctx: &'a mut RenderContext<B>,
}

impl<B: RenderBackend> Deref for FrameGuard<'_, B> {
    type Target = RenderContext<B>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<B: RenderBackend> DerefMut for FrameGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl<B: RenderBackend> Drop for FrameGuard<'_, B> {
    fn drop(&mut self) {
        self.ctx.restore_baseline();
    }
}

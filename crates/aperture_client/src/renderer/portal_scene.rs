use aperture_shared::portal::Portal;
use aperture_shared::quad::Quad;
use glam::{Mat4, Vec3, Vec4};
use tracing::debug;

use super::backend::{DepthCompare, ProgramKind, RenderBackend, StencilOp, Uniform, UniformValue};
use super::context::RenderContext;
use crate::scene::{Geometry, SceneNode};

const BASE_STENCIL_LEVEL: u32 = 0;

const SOFT_BLACK: Vec4 = Vec4::new(0.1, 0.1, 0.1, 1.0);
const SKY_BLUE: Vec4 = Vec4::new(0.53, 0.81, 0.92, 1.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Color passes over the base scene, one per rendered view.
    pub scene_passes: u32,
    /// Views rendered, the top-level view included.
    pub portal_views: u32,
    pub draw_calls: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub projection: Mat4,
    pub camera_view: Mat4,
    pub inception: Mat4,
    pub elapsed_s: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            camera_view: Mat4::IDENTITY,
            inception: Mat4::IDENTITY,
            elapsed_s: 0.0,
        }
    }
}

/// Draws the scene and, through stencil masking, whatever each portal shows,
/// nested up to `depth` levels.
pub struct PortalSceneRenderer {
    scene: SceneNode,
    portals: Vec<Portal>,
    /// One surface per portal, in portal order.
    portal_model: SceneNode,
    fill: Geometry,
    depth: u32,
    far: f32,
    debug: bool,
}

impl PortalSceneRenderer {
    pub fn new(scene: SceneNode, portals: Vec<Portal>, depth: u32, far: f32) -> Self {
        let portal_model = portals
            .iter()
            .enumerate()
            .fold(SceneNode::new("portals"), |model, (index, portal)| {
                model.with_geometry(Geometry::from_quad(
                    format!("portal_{index}"),
                    &portal.event_horizon,
                ))
            });
        let fill = Geometry::from_quad("fill", &Quad::new(Vec3::ZERO, Vec3::Z, Vec3::X, Vec3::ONE));

        Self {
            scene,
            portals,
            portal_model,
            fill,
            depth,
            far,
            debug: false,
        }
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn scene(&self) -> &SceneNode {
        &self.scene
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn render_frame<B: RenderBackend>(
        &self,
        ctx: &mut RenderContext<B>,
        frame: &FrameParams,
    ) -> RenderStats {
        let mut guard = ctx.frame();
        let ctx: &mut RenderContext<B> = &mut guard;
        ctx.clear(SOFT_BLACK);

        ctx.use_program(ProgramKind::Fill)
            .uniform(Uniform::FillColor, UniformValue::Vec4(SKY_BLUE))
            .uniform(Uniform::FillDepth, UniformValue::Float(self.far));
        ctx.use_program(ProgramKind::Scene)
            .uniform(Uniform::Elapsed, UniformValue::Float(frame.elapsed_s))
            .uniform(Uniform::Glow, UniformValue::Float(0.0))
            .uniform(Uniform::Projection, UniformValue::Mat4(frame.projection))
            .uniform(Uniform::CameraView, UniformValue::Mat4(frame.camera_view))
            .uniform(Uniform::Inception, UniformValue::Mat4(frame.inception))
            .uniform(Uniform::PortalView, UniformValue::Mat4(Mat4::IDENTITY))
            .uniform(Uniform::WorldView, UniformValue::Mat4(Mat4::IDENTITY));

        let mut stats = RenderStats::default();
        self.draw_portal_scene(ctx, Mat4::IDENTITY, BASE_STENCIL_LEVEL, self.depth, &mut stats);
        stats.draw_calls = ctx.draw_calls();
        debug!(
            views = stats.portal_views,
            draw_calls = stats.draw_calls,
            "frame rendered"
        );
        stats
    }

    /// Renders the view with world transform `mv` into the pixels whose
    /// stencil value is `level`, recursing `depth` more times through every
    /// portal.
    fn draw_portal_scene<B: RenderBackend>(
        &self,
        ctx: &mut RenderContext<B>,
        mv: Mat4,
        level: u32,
        depth: u32,
        stats: &mut RenderStats,
    ) {
        stats.portal_views += 1;
        let nested = level > BASE_STENCIL_LEVEL;

        if depth == 0 {
            ctx.clip_plane(nested)
                .stencil_mask(level)
                .stencil_op(StencilOp::Keep)
                .color_write(true);
            self.draw_model(ctx, mv, &self.scene, false);
            stats.scene_passes += 1;
            ctx.stencil_off().clip_plane(false);
            return;
        }

        // Depth only, so hidden portals fail the test below.
        ctx.stencil_mask(level).color_write(false);
        self.draw_model(ctx, mv, &self.scene, false);

        // Portal coverage goes to level + 1.
        ctx.depth(DepthCompare::LessEqual)
            .stencil_op(StencilOp::Increment)
            .face_culling(true);
        self.draw_model(ctx, mv, &self.portal_model, false);
        if self.debug {
            self.draw_model(ctx, mv, &self.portal_model, true);
        }
        ctx.face_culling(false)
            .color_write(true)
            .stencil_op(StencilOp::Keep);

        // Everything outside the portals at this level.
        ctx.clip_plane(nested);
        self.draw_model(ctx, mv, &self.scene, false);
        stats.scene_passes += 1;

        if self.debug {
            ctx.uniform(Uniform::Glow, UniformValue::Float(1.0))
                .stencil_mask(level + 1);
            self.draw_model(ctx, mv, &self.portal_model, true);
            ctx.uniform(Uniform::Glow, UniformValue::Float(0.0));
        }
        ctx.clip_plane(false);

        self.step_down(ctx, level + 1);
        self.resume_level(ctx, level);

        for (index, portal) in self.portals.iter().enumerate() {
            ctx.color_write(false)
                .stencil_op(StencilOp::Increment)
                .uniform(Uniform::WorldView, UniformValue::Mat4(mv))
                .face_culling(true);
            self.draw_geometry(ctx, &self.portal_model.geometry[index], false);
            ctx.face_culling(false).stencil_op(StencilOp::Keep);

            // Push depth back to the far plane inside the footprint so the far
            // side is not hidden by what is in front of the portal.
            ctx.use_program(ProgramKind::Fill)
                .depth(DepthCompare::Always)
                .stencil_mask(level + 1);
            self.draw_geometry(ctx, &self.fill, false);
            self.resume_level(ctx, level);

            ctx.uniform(Uniform::PortalView, UniformValue::Mat4(portal.portal_view));
            self.draw_portal_scene(ctx, mv * portal.transform, level + 1, depth - 1, stats);

            self.step_down(ctx, level + 1);
            self.resume_level(ctx, level);
        }

        ctx.stencil_off();
    }

    /// Drops every pixel at `level` back to `level - 1`.
    fn step_down<B: RenderBackend>(&self, ctx: &mut RenderContext<B>, level: u32) {
        ctx.use_program(ProgramKind::Fill)
            .stencil_mask(level)
            .depth_off()
            .color_write(false)
            .stencil_op(StencilOp::Decrement);
        self.draw_geometry(ctx, &self.fill, false);
        ctx.stencil_op(StencilOp::Keep).stencil_off();
    }

    fn resume_level<B: RenderBackend>(&self, ctx: &mut RenderContext<B>, level: u32) {
        ctx.use_program(ProgramKind::Scene)
            .stencil_mask(level)
            .depth(DepthCompare::LessEqual)
            .color_write(true)
            .stencil_op(StencilOp::Keep);
    }

    fn draw_model<B: RenderBackend>(
        &self,
        ctx: &mut RenderContext<B>,
        mv: Mat4,
        node: &SceneNode,
        lines: bool,
    ) {
        let world = mv * node.transform;
        ctx.uniform(Uniform::WorldView, UniformValue::Mat4(world));
        for geometry in &node.geometry {
            self.draw_geometry(ctx, geometry, lines);
        }
        for child in &node.children {
            self.draw_model(ctx, world, child, lines);
        }
    }

    fn draw_geometry<B: RenderBackend>(
        &self,
        ctx: &mut RenderContext<B>,
        geometry: &Geometry,
        lines: bool,
    ) {
        for elements in &geometry.elements {
            if elements.primitive.is_lines() == lines {
                ctx.draw(geometry, elements);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use aperture_shared::portal::Portal;
    use aperture_shared::quad::Quad;
    use glam::{Mat4, Vec3};

    use super::{FrameParams, PortalSceneRenderer};
    use crate::renderer::backend::{DepthCompare, ProgramKind, StencilOp};
    use crate::renderer::context::{RasterFlags, RasterState, RenderContext};
    use crate::renderer::recorder::{DrawRecord, RecordingBackend};
    use crate::scene::{Geometry, Primitive, SceneNode};

    fn scene() -> SceneNode {
        SceneNode::new("scene")
            .with_geometry(Geometry::from_quad(
                "floor",
                &Quad::new(Vec3::ZERO, Vec3::Y, Vec3::X, Vec3::splat(10.0)),
            ))
            .with_geometry(Geometry::from_quad(
                "wall",
                &Quad::new(Vec3::new(0.0, 1.0, -8.0), Vec3::Z, Vec3::X, Vec3::splat(4.0)),
            ))
    }

    fn portals(count: usize) -> Vec<Portal> {
        let a = Quad::new(Vec3::new(0.0, 1.0, -5.0), Vec3::Z, Vec3::X, Vec3::ONE);
        let b = Quad::new(Vec3::new(-2.0, 1.0, 0.0), Vec3::X, Vec3::Z, Vec3::ONE);
        let pair = Portal::pair(&a, &b).expect("portal pair");
        pair.into_iter().take(count).collect()
    }

    fn render(count: usize, depth: u32, debug: bool) -> (super::RenderStats, RecordingBackend) {
        let mut renderer = PortalSceneRenderer::new(scene(), portals(count), depth, 100.0);
        renderer.set_debug(debug);
        let mut ctx = RenderContext::new(RecordingBackend::default());
        let stats = renderer.render_frame(&mut ctx, &FrameParams::default());
        (stats, ctx.into_backend())
    }

    fn is_scene_color_draw(draw: &DrawRecord) -> bool {
        matches!(draw.geometry.as_str(), "floor" | "wall")
            && draw.state.flags.contains(RasterFlags::COLOR_WRITE)
    }

    #[test]
    fn view_count_grows_geometrically_with_depth() {
        for portal_count in 0..=2u32 {
            for depth in 0..=3u32 {
                let (stats, _) = render(portal_count as usize, depth, false);
                let expected: u32 = (0..=depth).map(|i| portal_count.pow(i)).sum();
                assert_eq!(stats.portal_views, expected, "k={portal_count} d={depth}");
                assert_eq!(stats.scene_passes, expected, "k={portal_count} d={depth}");
            }
        }
    }

    #[test]
    fn every_view_draws_the_scene_in_color_once() {
        let (stats, backend) = render(2, 2, false);
        let color_draws = backend.draws().filter(|d| is_scene_color_draw(d)).count();
        assert_eq!(color_draws as u32, stats.scene_passes * 2);
        assert_eq!(stats.draw_calls as usize, backend.draws().count());
    }

    #[test]
    fn scene_color_draws_use_the_scene_program() {
        let (_, backend) = render(2, 2, false);
        assert!(backend
            .draws()
            .filter(|d| is_scene_color_draw(d))
            .all(|d| d.program == Some(ProgramKind::Scene)));
    }

    #[test]
    fn frame_leaves_baseline_state_behind() {
        let (_, backend) = render(2, 3, true);
        assert_eq!(backend.state(), RasterState::BASELINE);
    }

    #[test]
    fn nested_views_see_the_scene_through_the_portal_transform() {
        let (_, backend) = render(2, 1, false);
        let links = portals(2);

        let nested: Vec<&DrawRecord> = backend
            .draws()
            .filter(|d| is_scene_color_draw(d) && d.state.stencil_ref == 1)
            .collect();
        assert_eq!(nested.len(), 4);
        for (index, portal) in links.iter().enumerate() {
            for draw in &nested[index * 2..index * 2 + 2] {
                assert!(draw.world_view.abs_diff_eq(portal.transform, 1e-5));
            }
        }

        let top: Vec<&DrawRecord> = backend
            .draws()
            .filter(|d| is_scene_color_draw(d) && d.state.stencil_ref == 0)
            .collect();
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|d| d.world_view == Mat4::IDENTITY));
    }

    #[test]
    fn clip_plane_only_applies_inside_portals() {
        let (_, backend) = render(2, 2, false);
        for draw in backend.draws().filter(|d| is_scene_color_draw(d)) {
            assert_eq!(
                draw.state.flags.contains(RasterFlags::CLIP_PLANE),
                draw.state.stencil_ref > 0
            );
        }
    }

    #[test]
    fn portal_footprints_are_culled_and_invisible() {
        let (_, backend) = render(2, 1, false);
        let footprints: Vec<&DrawRecord> = backend
            .draws()
            .filter(|d| d.geometry.starts_with("portal_"))
            .collect();
        assert!(!footprints.is_empty());
        for draw in footprints {
            assert!(draw.state.flags.contains(RasterFlags::FACE_CULL));
            assert!(!draw.state.flags.contains(RasterFlags::COLOR_WRITE));
            assert_eq!(draw.primitive, Primitive::TriangleStrip);
        }
    }

    #[test]
    fn debug_outlines_glow() {
        let (_, plain) = render(2, 1, false);
        assert!(plain.draws().all(|d| d.primitive != Primitive::Lines));

        let (_, debug) = render(2, 1, true);
        let glowing = debug
            .draws()
            .filter(|d| d.primitive == Primitive::Lines && d.glow == 1.0)
            .count();
        assert!(glowing > 0);
        assert!(debug
            .draws()
            .filter(|d| d.primitive != Primitive::Lines)
            .all(|d| d.glow == 0.0));
    }

    #[test]
    fn depth_zero_draws_only_the_scene() {
        let (stats, backend) = render(2, 0, false);
        assert_eq!(stats.portal_views, 1);
        assert_eq!(backend.draws().count(), 2);
    }

    #[test]
    fn each_portal_is_marked_cleared_drawn_and_stepped_down_in_order() {
        let (_, backend) = render(2, 1, false);
        let draws: Vec<&DrawRecord> = backend.draws().collect();

        let mut previous_step_down = None;
        for index in 0..2 {
            let name = format!("portal_{index}");
            let footprint = draws
                .iter()
                .rposition(|d| d.geometry == name)
                .expect("portal footprint drawn");
            if let Some(previous) = previous_step_down {
                assert_eq!(footprint, previous + 1, "portal {index} starts after the last step down");
            }

            let mark = draws[footprint];
            assert_eq!(mark.state.stencil_op, StencilOp::Increment);
            assert_eq!(mark.state.stencil_ref, 0);

            let clear = draws[footprint + 1];
            assert_eq!(clear.geometry, "fill");
            assert_eq!(clear.program, Some(ProgramKind::Fill));
            assert_eq!(clear.state.depth_compare, DepthCompare::Always);
            assert!(clear.state.flags.contains(RasterFlags::DEPTH_TEST));
            assert!(!clear.state.flags.contains(RasterFlags::COLOR_WRITE));
            assert_eq!(clear.state.stencil_ref, 1);

            for nested in &draws[footprint + 2..footprint + 4] {
                assert!(is_scene_color_draw(nested));
                assert_eq!(nested.state.stencil_ref, 1);
            }

            let step_down = draws[footprint + 4];
            assert_eq!(step_down.geometry, "fill");
            assert_eq!(step_down.state.stencil_op, StencilOp::Decrement);
            assert_eq!(step_down.state.stencil_ref, 1);
            assert!(!step_down.state.flags.contains(RasterFlags::DEPTH_TEST));
            assert!(!step_down.state.flags.contains(RasterFlags::COLOR_WRITE));
            previous_step_down = Some(footprint + 4);
        }

        assert_eq!(previous_step_down, Some(draws.len() - 1));
    }
}

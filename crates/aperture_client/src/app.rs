use aperture_shared::constants::GameConstants;
use aperture_shared::player::Player;
use aperture_shared::simulation::{ObserverSimulator, TickReport};
use glam::Vec2;
use tracing::info;
use winit::keyboard::KeyCode;

use crate::camera::Projection;
use crate::input::{Action, Controls, InputState, PointerTracker};
use crate::renderer::{FrameParams, PortalSceneRenderer, RenderBackend, RenderContext, RenderStats};
use crate::scene::LoadedScene;
use crate::settings::Settings;

/// Everything one window needs between events: input, the observer, the
/// portal renderer and whether the last frame is stale.
pub struct PortalApp {
    constants: GameConstants,
    controls: Controls,
    input: InputState,
    pointer: PointerTracker,
    simulator: ObserverSimulator,
    renderer: PortalSceneRenderer,
    projection: Projection,
    width: u32,
    height: u32,
    elapsed_s: f32,
    invalid: bool,
    quit: bool,
}

impl PortalApp {
    pub fn new(settings: Settings, scene: LoadedScene, width: u32, height: u32) -> Self {
        let Settings { constants, controls } = settings;
        let mut renderer = PortalSceneRenderer::new(
            scene.root,
            scene.portals,
            constants.portal_depth,
            constants.player_view_far,
        );
        renderer.set_debug(constants.debug);
        let projection = Projection::from_constants(&constants, width, height);

        Self {
            constants,
            controls,
            input: InputState::default(),
            pointer: PointerTracker::default(),
            simulator: ObserverSimulator::new(Player::default()),
            renderer,
            projection,
            width,
            height,
            elapsed_s: 0.0,
            invalid: true,
            quit: false,
        }
    }

    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    pub fn player(&self) -> &Player {
        &self.simulator.player
    }

    pub fn simulator(&self) -> &ObserverSimulator {
        &self.simulator
    }

    pub fn renderer(&self) -> &PortalSceneRenderer {
        &self.renderer
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Applies a key transition and returns the action it was bound to.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> Option<Action> {
        let action = self.controls.action(key)?;
        let fresh = self.input.set_action(action, pressed);

        match action {
            Action::Quit if fresh => self.quit = true,
            Action::ToggleDebug if fresh => self.toggle_debug(),
            _ => self.sync_input(),
        }
        self.invalid = true;
        Some(action)
    }

    pub fn handle_pointer(&mut self, x: f32, y: f32) {
        let delta = self.pointer.sample(x, y, self.width, self.height);
        if delta == Vec2::ZERO {
            return;
        }

        self.simulator.player.pan_view(
            delta,
            self.constants.player_fov,
            self.constants.player_pan_sensitivity,
        );
        self.invalid = true;
    }

    pub fn focus_lost(&mut self) {
        self.pointer.reset();
        self.input.release_all();
        self.sync_input();
    }

    pub fn reshape(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.projection.reshape(width, height);
        self.invalid = true;
    }

    pub fn simulate(&mut self, delta_s: f32) -> TickReport {
        self.elapsed_s += delta_s;
        let report = self
            .simulator
            .step(delta_s, self.renderer.portals(), &self.constants);
        if let Some(portal) = report.crossed {
            info!(
                portal,
                position = ?self.simulator.player.position,
                "Player crossed portal"
            );
        }
        report
    }

    pub fn draw<B: RenderBackend>(&mut self, ctx: &mut RenderContext<B>) -> RenderStats {
        let frame = FrameParams {
            projection: self.projection.matrix(),
            camera_view: self.simulator.view_matrix(),
            inception: self.simulator.inception,
            elapsed_s: self.elapsed_s,
        };
        let stats = self.renderer.render_frame(ctx, &frame);
        self.invalid = false;
        stats
    }

    pub fn is_idle(&self) -> bool {
        self.simulator.is_idle()
    }

    pub fn needs_render(&self) -> bool {
        !self.is_idle() || self.invalid
    }

    pub fn toggle_debug(&mut self) {
        self.constants.debug = !self.constants.debug;
        self.renderer.set_debug(self.constants.debug);
        info!("Debug overlay {}", if self.constants.debug { "on" } else { "off" });
        self.invalid = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    fn sync_input(&mut self) {
        self.simulator.input.movement = self.input.movement();
        self.simulator.input.impulse += self.input.take_impulse();
    }
}

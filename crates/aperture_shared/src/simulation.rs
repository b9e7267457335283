use glam::{Mat4, Vec3};
use tracing::debug;

use crate::constants::GameConstants;
use crate::math::near_zero;
use crate::player::Player;
use crate::portal::Portal;

/// Input accumulated between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UiState {
    /// One-shot push (jump). Consumed by the next tick.
    pub impulse: Vec3,
    /// Held locomotion direction in body space.
    pub movement: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Index into the portal list of the horizon crossed this tick.
    pub crossed: Option<usize>,
    pub displacement: Vec3,
}

#[derive(Debug, Clone)]
pub struct ObserverSimulator {
    pub player: Player,
    pub input: UiState,
    /// Net transform between world space and the space the player now
    /// occupies. Only fed to shaders and debug output.
    pub inception: Mat4,
}

impl Default for ObserverSimulator {
    fn default() -> Self {
        Self::new(Player::default())
    }
}

impl ObserverSimulator {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            input: UiState::default(),
            inception: Mat4::IDENTITY,
        }
    }

    /// Advances the player by one tick of `delta_s` seconds.
    ///
    /// Portals are tested in list order and the first crossing wins.
    pub fn step(
        &mut self,
        delta_s: f32,
        portals: &[Portal],
        constants: &GameConstants,
    ) -> TickReport {
        if !near_zero(self.input.impulse) {
            let regulated =
                self.input.impulse.normalize() * constants.player_impulse_momentum_limit;
            self.player.velocity += self.player.heading_rotate(regulated);
            self.input.impulse = Vec3::ZERO;
        }

        let mut aggregate_velocity = self.player.velocity;
        if !near_zero(self.input.movement) {
            let regulated = self.input.movement.normalize() * constants.player_movement_limit;
            aggregate_velocity += self.player.heading_rotate(regulated);
        }

        let mut dp = aggregate_velocity * delta_s;

        let mut crossed = None;
        for (index, portal) in portals.iter().enumerate() {
            let Some(t) = portal.crossing_time(self.player.position, dp) else {
                continue;
            };

            let traverse = portal.transform.inverse();
            self.player.transform(&traverse);
            dp = traverse.transform_vector3(dp);
            self.inception *= portal.transform;
            debug!(portal = index, t, position = ?self.player.position, "crossed portal");
            crossed = Some(index);
            break;
        }

        let start = self.player.position;
        self.player.position = start + dp;

        let ground = constants.ground_height;
        if self.player.position.y > ground {
            self.player.velocity.y += constants.gravity * delta_s;
        } else {
            self.player.velocity.y = 0.0;
            if start.y >= ground {
                self.player.position.y = ground;
            }
        }

        TickReport {
            crossed,
            displacement: dp,
        }
    }

    /// Nothing is pushing, steering or carrying the player.
    pub fn is_idle(&self) -> bool {
        near_zero(self.input.impulse)
            && near_zero(self.input.movement)
            && near_zero(self.player.velocity)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.player.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Quat, Vec3};

    use super::ObserverSimulator;
    use crate::constants::GameConstants;
    use crate::player::Player;
    use crate::portal::Portal;
    use crate::quad::Quad;

    const DT: f32 = 0.1;

    fn linked_portals() -> Vec<Portal> {
        let a = Quad::new(Vec3::new(0.0, 1.0, -5.0), Vec3::Z, Vec3::X, Vec3::ONE);
        let b = Quad::new(Vec3::new(-2.0, 1.0, 0.0), Vec3::X, Vec3::NEG_Z, Vec3::ONE);
        Portal::pair(&a, &b).expect("valid pair").to_vec()
    }

    #[test]
    fn idle_only_when_nothing_moves() {
        let mut sim = ObserverSimulator::default();
        assert!(sim.is_idle());

        sim.input.impulse = Vec3::Y;
        assert!(!sim.is_idle());
        sim.input.impulse = Vec3::ZERO;

        sim.input.movement = Vec3::NEG_Z;
        assert!(!sim.is_idle());
        sim.input.movement = Vec3::ZERO;

        sim.player.velocity = Vec3::new(0.0, 0.0, 0.5);
        assert!(!sim.is_idle());
    }

    #[test]
    fn impulse_is_consumed_exactly_once() {
        let constants = GameConstants::default();
        let mut sim = ObserverSimulator::default();
        sim.input.impulse = Vec3::new(0.0, 3.0, 0.0);

        sim.step(DT, &[], &constants);

        assert_eq!(sim.input.impulse, Vec3::ZERO);
        let expected_vy = constants.player_impulse_momentum_limit + constants.gravity * DT;
        assert!((sim.player.velocity.y - expected_vy).abs() < 1.0e-5);
        assert!((sim.player.position.y - (1.0 + constants.player_impulse_momentum_limit * DT)).abs() < 1.0e-5);
    }

    #[test]
    fn movement_overrides_this_tick_without_accumulating() {
        let constants = GameConstants::default();
        let mut sim = ObserverSimulator::default();
        sim.input.movement = Vec3::new(0.0, 0.0, -2.0);

        sim.step(DT, &[], &constants);
        sim.step(DT, &[], &constants);

        assert_eq!(sim.player.velocity, Vec3::ZERO);
        let travelled = constants.player_movement_limit * DT * 2.0;
        assert!(sim
            .player
            .position
            .abs_diff_eq(Vec3::new(0.0, 1.0, -travelled), 1.0e-5));
    }

    #[test]
    fn movement_follows_heading_not_pitch() {
        let constants = GameConstants::default();
        let mut player = Player::default();
        player.orientation_h = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        player.orientation = player.orientation_h * Quat::from_rotation_x(0.8);
        let mut sim = ObserverSimulator::new(player);
        sim.input.movement = Vec3::NEG_Z;

        let report = sim.step(DT, &[], &constants);

        let step = constants.player_movement_limit * DT;
        assert!(report.displacement.abs_diff_eq(Vec3::new(-step, 0.0, 0.0), 1.0e-5));
    }

    #[test]
    fn landing_resets_vertical_velocity_and_clamps_to_ground() {
        let constants = GameConstants::default();
        let mut sim = ObserverSimulator::default();
        sim.player.velocity = Vec3::new(0.0, -3.0, 0.0);

        sim.step(DT, &[], &constants);

        assert_eq!(sim.player.velocity.y, 0.0);
        assert_eq!(sim.player.position.y, 1.0);
    }

    #[test]
    fn airborne_player_falls_under_gravity() {
        let constants = GameConstants::default();
        let mut sim = ObserverSimulator::default();
        sim.player.position.y = 4.0;

        sim.step(DT, &[], &constants);

        assert!((sim.player.velocity.y - constants.gravity * DT).abs() < 1.0e-6);
        assert_eq!(sim.player.position.y, 4.0);
    }

    #[test]
    fn player_below_ground_is_not_snapped_up() {
        let constants = GameConstants::default();
        let mut sim = ObserverSimulator::default();
        sim.player.position.y = 0.5;
        sim.player.velocity.y = -1.0;

        sim.step(DT, &[], &constants);

        assert_eq!(sim.player.velocity.y, 0.0);
        assert!((sim.player.position.y - 0.4).abs() < 1.0e-6);
    }

    #[test]
    fn crossing_a_portal_relocates_the_player_through_the_exit() {
        let constants = GameConstants::default();
        let portals = linked_portals();
        let mut player = Player::default();
        player.position = Vec3::new(0.0, 1.0, -5.1);
        player.velocity = Vec3::new(0.0, 0.0, 2.0);
        let mut sim = ObserverSimulator::new(player);

        let report = sim.step(DT, &portals, &constants);

        assert_eq!(report.crossed, Some(0));
        assert!(sim
            .player
            .position
            .abs_diff_eq(Vec3::new(-2.1, 1.0, 0.0), 1.0e-4));
        assert!(sim
            .player
            .velocity
            .abs_diff_eq(Vec3::new(-2.0, 0.0, 0.0), 1.0e-4));
        assert!(sim.inception.abs_diff_eq(portals[0].transform, 1.0e-5));

        let facing = sim.player.orientation * Vec3::NEG_Z;
        assert!(facing.abs_diff_eq(Vec3::X, 1.0e-4));
    }

    #[test]
    fn walking_back_through_the_exit_returns_to_the_entry() {
        let constants = GameConstants::default();
        let portals = linked_portals();
        let mut player = Player::default();
        player.position = Vec3::new(0.0, 1.0, -5.1);
        player.velocity = Vec3::new(0.0, 0.0, 2.0);
        let mut sim = ObserverSimulator::new(player);

        sim.step(DT, &portals, &constants);
        sim.player.velocity = -sim.player.velocity;
        let report = sim.step(DT, &portals, &constants);

        assert_eq!(report.crossed, Some(1));
        assert!(sim
            .player
            .position
            .abs_diff_eq(Vec3::new(0.0, 1.0, -5.1), 1.0e-4));
        assert!(sim.inception.abs_diff_eq(Mat4::IDENTITY, 1.0e-4));
    }

    #[test]
    fn missing_the_portal_leaves_everything_in_world_space() {
        let constants = GameConstants::default();
        let portals = linked_portals();
        let mut player = Player::default();
        player.position = Vec3::new(3.0, 1.0, -5.1);
        player.velocity = Vec3::new(0.0, 0.0, 2.0);
        let mut sim = ObserverSimulator::new(player);

        let report = sim.step(DT, &portals, &constants);

        assert_eq!(report.crossed, None);
        assert_eq!(sim.inception, Mat4::IDENTITY);
        assert!(sim
            .player
            .position
            .abs_diff_eq(Vec3::new(3.0, 1.0, -4.9), 1.0e-5));
    }
}

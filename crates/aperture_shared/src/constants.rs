use serde::{Deserialize, Serialize};

use crate::error::ConstantsError;

/// Nesting levels an 8-bit stencil buffer can tell apart.
pub const MAX_PORTAL_DEPTH: u32 = u8::MAX as u32;

/// Gameplay tunables. Every field falls back to its default when a settings
/// file leaves it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConstants {
    pub player_movement_limit: f32,
    pub player_impulse_momentum_limit: f32,
    pub gravity: f32,
    pub player_pan_sensitivity: f32,
    /// Vertical field of view in degrees.
    pub player_fov: f32,
    pub player_view_near: f32,
    pub player_view_far: f32,
    pub debug: bool,
    /// How many nested portal views are rendered.
    pub portal_depth: u32,
    pub ground_height: f32,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            player_movement_limit: 5.0,
            player_impulse_momentum_limit: 5.0,
            gravity: -9.8,
            player_pan_sensitivity: 7.0,
            player_fov: 70.0,
            player_view_near: 0.001,
            player_view_far: 100.0,
            debug: false,
            portal_depth: 1,
            ground_height: 1.0,
        }
    }
}

impl GameConstants {
    pub fn validate(&self) -> Result<(), ConstantsError> {
        let near = self.player_view_near;
        let far = self.player_view_far;
        if !(near.is_finite() && near > 0.0) {
            return Err(ConstantsError::NearPlane { near });
        }
        if !(far.is_finite() && far > near) {
            return Err(ConstantsError::FarPlane { near, far });
        }
        if !(self.player_fov > 0.0 && self.player_fov < 180.0) {
            return Err(ConstantsError::FieldOfView {
                fov: self.player_fov,
            });
        }
        if self.portal_depth > MAX_PORTAL_DEPTH {
            return Err(ConstantsError::PortalDepth {
                depth: self.portal_depth,
                max: MAX_PORTAL_DEPTH,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{GameConstants, MAX_PORTAL_DEPTH};
    use crate::error::ConstantsError;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GameConstants::default().validate(), Ok(()));
    }

    #[test]
    fn clip_planes_must_be_ordered_and_positive() {
        let mut constants = GameConstants {
            player_view_near: 0.0,
            ..GameConstants::default()
        };
        assert!(matches!(constants.validate(), Err(ConstantsError::NearPlane { .. })));

        constants.player_view_near = 10.0;
        constants.player_view_far = 10.0;
        assert!(matches!(constants.validate(), Err(ConstantsError::FarPlane { .. })));
    }

    #[test]
    fn field_of_view_must_be_a_real_angle() {
        let constants = GameConstants {
            player_fov: 180.0,
            ..GameConstants::default()
        };
        assert!(matches!(constants.validate(), Err(ConstantsError::FieldOfView { .. })));
    }

    #[test]
    fn portal_depth_fits_the_stencil() {
        let mut constants = GameConstants {
            portal_depth: MAX_PORTAL_DEPTH,
            ..GameConstants::default()
        };
        assert_eq!(constants.validate(), Ok(()));

        constants.portal_depth += 1;
        assert_eq!(
            constants.validate(),
            Err(ConstantsError::PortalDepth {
                depth: MAX_PORTAL_DEPTH + 1,
                max: MAX_PORTAL_DEPTH
            })
        );
    }
}

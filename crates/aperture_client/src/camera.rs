use aperture_shared::constants::GameConstants;
use glam::Mat4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_constants(&GameConstants::default(), 16, 9)
    }
}

impl Projection {
    pub fn from_constants(constants: &GameConstants, width: u32, height: u32) -> Self {
        let mut projection = Self {
            fov: constants.player_fov,
            aspect: 1.0,
            near: constants.player_view_near,
            far: constants.player_view_far,
        };
        projection.reshape(width, height);
        projection
    }

    pub fn reshape(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Right-handed, GL clip depth range.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aperture_shared::constants::GameConstants;
use aperture_shared::error::ConstantsError;
use serde::Deserialize;
use tracing::{info, warn};
use winit::keyboard::KeyCode;

use crate::input::{Action, Controls};

pub const DEFAULT_SETTINGS_PATH: &str = "aperture.toml";

#[derive(Debug)]
pub enum SettingsError {
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid { path: PathBuf, source: ConstantsError },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read settings {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse settings {}: {source}", path.display())
            }
            Self::Invalid { path, source } => {
                write!(f, "invalid settings {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    constants: GameConstants,
    /// Action name to key name.
    controls: BTreeMap<String, KeyCode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub constants: GameConstants,
    pub controls: Controls,
}

impl Settings {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let file: SettingsFile = toml::from_str(contents)?;

        let mut controls = Controls::default();
        for (name, key) in file.controls {
            match Action::from_name(&name) {
                Some(action) => controls.bind(action, key),
                None => warn!("ignoring binding for unknown action '{name}'"),
            }
        }

        Ok(Self {
            constants: file.constants,
            controls,
        })
    }

    /// Reads settings from `path`. A file that does not exist yields the
    /// defaults; constants out of their usable range are an error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let settings = Self::from_toml(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings
            .constants
            .validate()
            .map_err(|source| SettingsError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use aperture_shared::constants::GameConstants;
    use aperture_shared::error::ConstantsError;
    use winit::keyboard::KeyCode;

    use super::{Settings, SettingsError};
    use crate::input::{Action, Controls};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("aperture-settings-{}-{name}", std::process::id()))
    }

    #[test]
    fn empty_document_gives_defaults() {
        let settings = Settings::from_toml("").expect("parse");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_constants_keep_remaining_defaults() {
        let settings = Settings::from_toml(
            r#"
            [constants]
            gravity = -3.5
            portal_depth = 3
            "#,
        )
        .expect("parse");

        let defaults = GameConstants::default();
        assert_eq!(settings.constants.gravity, -3.5);
        assert_eq!(settings.constants.portal_depth, 3);
        assert_eq!(settings.constants.player_fov, defaults.player_fov);
        assert_eq!(settings.constants.ground_height, defaults.ground_height);
    }

    #[test]
    fn controls_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            [controls]
            move_forward = "ArrowUp"
            quit = "KeyX"
            "#,
        )
        .expect("parse");

        assert_eq!(settings.controls.action(KeyCode::ArrowUp), Some(Action::MoveForward));
        assert_eq!(settings.controls.action(KeyCode::KeyW), None);
        assert_eq!(settings.controls.key(Action::Quit), Some(KeyCode::KeyX));
        assert_eq!(settings.controls.key(Action::Jump), Controls::default().key(Action::Jump));
    }

    #[test]
    fn unknown_action_is_ignored() {
        let settings = Settings::from_toml(
            r#"
            [controls]
            teleport = "KeyT"
            "#,
        )
        .expect("parse");
        assert_eq!(settings.controls, Controls::default());
    }

    #[test]
    fn unknown_key_name_is_rejected() {
        let result = Settings::from_toml(
            r#"
            [controls]
            jump = "NotAKey"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = scratch_path("missing.toml");
        let settings = Settings::load(&path).expect("defaults");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let path = scratch_path("malformed.toml");
        std::fs::write(&path, "[constants\ngravity = ").expect("write scratch file");

        let err = Settings::load(&path).expect_err("malformed settings");
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("malformed.toml"));
    }

    #[test]
    fn file_contents_are_applied() {
        let path = scratch_path("valid.toml");
        std::fs::write(&path, "[constants]\ndebug = true\n").expect("write scratch file");

        let settings = Settings::load(&path);
        std::fs::remove_file(&path).ok();

        assert!(settings.expect("load").constants.debug);
    }

    #[test]
    fn out_of_range_constants_are_fatal() {
        let path = scratch_path("inverted-planes.toml");
        std::fs::write(&path, "[constants]\nplayer_view_near = 5.0\nplayer_view_far = 1.0\n")
            .expect("write scratch file");

        let err = Settings::load(&path).expect_err("inverted clip planes");
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            err,
            SettingsError::Invalid {
                source: ConstantsError::FarPlane { .. },
                ..
            }
        ));
    }

    #[test]
    fn oversized_portal_depth_is_fatal() {
        let path = scratch_path("deep.toml");
        std::fs::write(&path, "[constants]\nportal_depth = 300\n").expect("write scratch file");

        let err = Settings::load(&path).expect_err("portal depth beyond stencil");
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            err,
            SettingsError::Invalid {
                source: ConstantsError::PortalDepth { depth: 300, .. },
                ..
            }
        ));
    }
}

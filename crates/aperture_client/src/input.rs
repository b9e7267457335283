use std::fmt;

use glam::{Vec2, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use winit::keyboard::KeyCode;

/// Named by `name()` in the `[controls]` settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    MoveUp,
    MoveDown,
    Jump,
    Quit,
    ToggleDebug,
}

impl Action {
    pub const ALL: [Self; 9] = [
        Self::MoveForward,
        Self::MoveBackward,
        Self::StrafeLeft,
        Self::StrafeRight,
        Self::MoveUp,
        Self::MoveDown,
        Self::Jump,
        Self::Quit,
        Self::ToggleDebug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MoveForward => "move_forward",
            Self::MoveBackward => "move_backward",
            Self::StrafeLeft => "strafe_left",
            Self::StrafeRight => "strafe_right",
            Self::MoveUp => "move_up",
            Self::MoveDown => "move_down",
            Self::Jump => "jump",
            Self::Quit => "quit",
            Self::ToggleDebug => "toggle_debug",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    /// Body-space direction contributed while the action is held.
    pub fn movement(self) -> Option<Vec3> {
        match self {
            Self::MoveForward => Some(Vec3::NEG_Z),
            Self::MoveBackward => Some(Vec3::Z),
            Self::StrafeLeft => Some(Vec3::NEG_X),
            Self::StrafeRight => Some(Vec3::X),
            Self::MoveUp => Some(Vec3::Y),
            Self::MoveDown => Some(Vec3::NEG_Y),
            Self::Jump | Self::Quit | Self::ToggleDebug => None,
        }
    }

    fn default_key(self) -> KeyCode {
        match self {
            Self::MoveForward => KeyCode::KeyW,
            Self::MoveBackward => KeyCode::KeyS,
            Self::StrafeLeft => KeyCode::KeyA,
            Self::StrafeRight => KeyCode::KeyD,
            Self::MoveUp => KeyCode::KeyE,
            Self::MoveDown => KeyCode::KeyQ,
            Self::Jump => KeyCode::Space,
            Self::Quit => KeyCode::Escape,
            Self::ToggleDebug => KeyCode::Backquote,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key to action table. Each action has at most one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    bindings: FxHashMap<KeyCode, Action>,
}

impl Default for Controls {
    fn default() -> Self {
        let mut controls = Self {
            bindings: FxHashMap::default(),
        };
        for action in Action::ALL {
            controls.bind(action, action.default_key());
        }
        controls
    }
}

impl Controls {
    /// Moves `action` to `key`, dropping its previous key and whatever `key`
    /// was bound to before.
    pub fn bind(&mut self, action: Action, key: KeyCode) {
        self.bindings.retain(|_, bound| *bound != action);
        self.bindings.insert(key, action);
    }

    pub fn action(&self, key: KeyCode) -> Option<Action> {
        self.bindings.get(&key).copied()
    }

    pub fn key(&self, action: Action) -> Option<KeyCode> {
        self.bindings
            .iter()
            .find_map(|(key, bound)| (*bound == action).then_some(*key))
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    held: FxHashSet<Action>,
    impulse: Vec3,
}

impl InputState {
    /// Returns true when this is a fresh press rather than a repeat or a
    /// release.
    pub fn set_action(&mut self, action: Action, pressed: bool) -> bool {
        if !pressed {
            self.held.remove(&action);
            return false;
        }

        let fresh = self.held.insert(action);
        if fresh && action == Action::Jump {
            self.impulse += Vec3::Y;
        }
        fresh
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn movement(&self) -> Vec3 {
        self.held.iter().filter_map(|action| action.movement()).sum()
    }

    pub fn take_impulse(&mut self) -> Vec3 {
        std::mem::take(&mut self.impulse)
    }

    /// Forgets held keys, for when their releases can no longer be seen.
    pub fn release_all(&mut self) {
        self.held.clear();
    }
}

/// Turns window pixel positions into frame-to-frame deltas in normalized
/// window units, `y` up.
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn sample(&mut self, x: f32, y: f32, width: u32, height: u32) -> Vec2 {
        if width == 0 || height == 0 {
            return Vec2::ZERO;
        }

        let current = Vec2::new(x / width as f32, 1.0 - y / height as f32);
        let delta = self.last.map_or(Vec2::ZERO, |last| current - last);
        self.last = Some(current);
        delta
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

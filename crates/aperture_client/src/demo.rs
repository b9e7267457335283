//! Built-in scene and scripted input for the headless binary.

use std::f32::consts::{FRAC_PI_2, PI};

use aperture_shared::quad::Quad;
use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

use crate::scene::{Geometry, SceneNode, UpAxis};

pub const DEMO_UP_AXIS: UpAxis = UpAxis::Y;

pub const DEMO_TICK_RATE: f32 = 60.0;

/// A 10x10 floor, a couple of marker walls and two linked portals: portal 0
/// stands five units ahead of the spawn point, portal 1 two units to its left
/// facing +X.
pub fn demo_asset() -> SceneNode {
    SceneNode::new("demo")
        .with_child(SceneNode::new("Floor").with_geometry(Geometry::from_quad(
            "floor",
            &Quad::new(Vec3::ZERO, Vec3::Y, Vec3::X, Vec3::new(5.0, 5.0, 1.0)),
        )))
        .with_child(
            SceneNode::new("Markers")
                .with_geometry(Geometry::from_quad(
                    "north_wall",
                    &Quad::new(Vec3::new(0.0, 1.0, -9.0), Vec3::Z, Vec3::X, Vec3::new(4.0, 2.0, 1.0)),
                ))
                .with_geometry(Geometry::from_quad(
                    "west_wall",
                    &Quad::new(Vec3::new(-8.0, 1.0, 0.0), Vec3::X, Vec3::Z, Vec3::new(4.0, 2.0, 1.0)),
                )),
        )
        .with_child(portal_placeholder(
            "Portal_0_1",
            Mat4::from_translation(Vec3::new(0.0, 1.0, -5.0)) * Mat4::from_rotation_y(PI),
        ))
        .with_child(portal_placeholder(
            "Portal_1_0",
            Mat4::from_translation(Vec3::new(-2.0, 1.0, 0.0)) * Mat4::from_rotation_y(FRAC_PI_2),
        ))
}

fn portal_placeholder(name: &str, transform: Mat4) -> SceneNode {
    SceneNode::new(name)
        .with_transform(transform)
        .with_geometry(Geometry::from_quad(
            "portal_frame",
            &Quad::new(Vec3::ZERO, Vec3::Z, Vec3::X, Vec3::ONE),
        ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptInput {
    Key { key: KeyCode, pressed: bool },
    Pointer { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptEvent {
    pub tick: u32,
    pub input: ScriptInput,
}

impl ScriptEvent {
    fn key(tick: u32, key: KeyCode, pressed: bool) -> Self {
        Self {
            tick,
            input: ScriptInput::Key { key, pressed },
        }
    }

    fn pointer(tick: u32, x: f32, y: f32) -> Self {
        Self {
            tick,
            input: ScriptInput::Pointer { x, y },
        }
    }
}

/// Walk forward through portal 0, hop, then look around. Events are sorted by
/// tick.
pub fn walk_script() -> Vec<ScriptEvent> {
    let mut script = vec![
        ScriptEvent::key(0, KeyCode::KeyW, true),
        ScriptEvent::key(90, KeyCode::KeyW, false),
        ScriptEvent::key(100, KeyCode::Space, true),
        ScriptEvent::key(101, KeyCode::Space, false),
    ];
    script.extend((0..20).map(|step| ScriptEvent::pointer(150 + step, 640.0 + step as f32 * 8.0, 360.0)));
    script.push(ScriptEvent::key(179, KeyCode::Escape, true));
    script
}

pub fn script_length(script: &[ScriptEvent]) -> u32 {
    script.last().map_or(0, |event| event.tick + 1)
}

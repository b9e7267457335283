use std::env;
use std::path::PathBuf;

use aperture_client::app::PortalApp;
use aperture_client::demo::{demo_asset, script_length, walk_script, ScriptInput, DEMO_TICK_RATE, DEMO_UP_AXIS};
use aperture_client::renderer::{RecordingBackend, RenderContext, RenderStats};
use aperture_client::scene::load_scene;
use aperture_client::settings::{Settings, DEFAULT_SETTINGS_PATH};
use tracing::info;

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;
const STATS_INTERVAL: u32 = 30;

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut config_path = PathBuf::from(DEFAULT_SETTINGS_PATH);
    let mut ticks: Option<u32> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(value) = args.next() else {
                    eprintln!("--config expects a path argument");
                    std::process::exit(2);
                };
                config_path = PathBuf::from(value);
            }
            "--ticks" => {
                let Some(value) = args.next() else {
                    eprintln!("--ticks expects a numeric argument");
                    std::process::exit(2);
                };
                match value.parse::<u32>() {
                    Ok(parsed) => ticks = Some(parsed),
                    Err(err) => {
                        eprintln!("invalid tick count '{value}': {err}");
                        std::process::exit(2);
                    }
                }
            }
            "--help" | "-h" => {
                println!("Usage: aperture_client [--config <path>] [--ticks <n>]");
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let scene = match load_scene(&demo_asset(), DEMO_UP_AXIS) {
        Ok(scene) => scene,
        Err(err) => {
            eprintln!("demo scene failed to load: {err}");
            std::process::exit(1);
        }
    };

    let mut app = PortalApp::new(settings, scene, WINDOW_WIDTH, WINDOW_HEIGHT);
    let mut ctx = RenderContext::new(RecordingBackend::default());

    let script = walk_script();
    let ticks = ticks.unwrap_or_else(|| script_length(&script));
    let mut pending = script.iter().peekable();
    let dt = 1.0 / DEMO_TICK_RATE;

    let mut frames = 0u32;
    let mut crossings = 0u32;
    let mut totals = RenderStats::default();

    for tick in 0..ticks {
        while let Some(event) = pending.next_if(|event| event.tick <= tick) {
            match event.input {
                ScriptInput::Key { key, pressed } => {
                    app.handle_key(key, pressed);
                }
                ScriptInput::Pointer { x, y } => app.handle_pointer(x, y),
            }
        }
        if app.should_quit() {
            info!(tick, "Quit requested");
            break;
        }

        if app.simulate(dt).crossed.is_some() {
            crossings += 1;
        }

        if app.needs_render() {
            ctx.backend_mut().clear_log();
            let stats = app.draw(&mut ctx);
            frames += 1;
            totals.scene_passes += stats.scene_passes;
            totals.portal_views += stats.portal_views;
            totals.draw_calls += stats.draw_calls;
            if frames % STATS_INTERVAL == 1 {
                info!(
                    tick,
                    views = stats.portal_views,
                    scene_passes = stats.scene_passes,
                    draw_calls = stats.draw_calls,
                    "Frame"
                );
            }
        }
    }

    let player = app.player();
    info!(
        frames,
        crossings,
        portal_views = totals.portal_views,
        draw_calls = totals.draw_calls,
        uploaded_bytes = ctx.backend().uploaded_bytes(),
        position = ?player.position,
        "Walk finished"
    );
}

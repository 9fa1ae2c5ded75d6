//! STARWAKE: real-time 2D space combat
//!
//! A galaxy of star systems simulated around the hero ship:
//! - Ships, stations, asteroids and loot on a rapier2d physics world
//! - Projectiles with homing, shields, armor and crash damage
//! - Objects far from the camera kept as lightweight snapshots
//! - Death, respawn inheritance and save/continue
//!
//! Flags: `--new-game`, `--tutorial`, `--verbose`.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod game;
mod logging;

use macroquad::prelude::*;

use game::config::REAL_TIME_STEP;
use game::runtime::{read_actions, read_input, FpsLimit, FrameTimings, HostAction};
use game::{Catalog, GameSession, Renderer, SaveManager, SessionStart, SimSettings};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("STARWAKE v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let flag = |name: &str| args.iter().any(|a| a == name);
    logging::init(flag("--verbose"));

    let saves = SaveManager::default_location();
    let mut settings = SimSettings::load_or_create(&saves.settings_path());
    if flag("--tutorial") {
        settings.tutorial = true;
    }
    let start = if flag("--new-game") || settings.tutorial {
        SessionStart::NewGame {
            ship: settings.starting_ship.clone(),
            seed: None,
        }
    } else {
        SessionStart::Continue
    };
    let mouse_control = settings.mouse_control;

    let mut session = GameSession::new(Catalog::builtin(), settings, saves, start);
    let mut renderer = Renderer::new();
    let mut fps_limit = FpsLimit::default();
    let mut timings = FrameTimings::default();

    // Closing the window goes through on_game_end like Escape does
    prevent_quit();

    loop {
        let frame_start = FrameTimings::start();

        let phase = FrameTimings::start();
        let input = read_input(mouse_control, session.camera());
        let mut quit = is_quit_requested();
        for action in read_actions() {
            match action {
                HostAction::TogglePause => session.set_paused(!session.is_paused()),
                HostAction::Respawn => session.respawn(),
                HostAction::Transcend => session.transcend(),
                HostAction::Land => session.land(),
                HostAction::ToggleMap => session.map_mut().toggle(),
                HostAction::MapZoomIn => session.map_mut().zoom_in(),
                HostAction::MapZoomOut => session.map_mut().zoom_out(),
                HostAction::CycleFpsLimit => {
                    fps_limit = fps_limit.next();
                    log::info!("fps limit: {}", fps_limit.label());
                }
                HostAction::Quit => quit = true,
            }
        }
        if quit {
            session.on_game_end();
            break;
        }
        timings.input_ms = FrameTimings::elapsed_ms(phase);

        let phase = FrameTimings::start();
        session.update(&input);
        // No audio backend yet; sounds are only traced
        for sound in session.events_mut().sounds.drain() {
            log::trace!("sound '{}' at ({:.1}, {:.1})", sound.sound, sound.position.x, sound.position.y);
        }
        renderer.absorb_effects(session.events_mut());
        renderer.update(REAL_TIME_STEP);
        timings.logic_ms = FrameTimings::elapsed_ms(phase);

        let phase = FrameTimings::start();
        renderer.draw(&session);
        renderer.draw_timings(&session, &timings, fps_limit);
        timings.render_ms = FrameTimings::elapsed_ms(phase);
        timings.total_ms = FrameTimings::elapsed_ms(frame_start);

        fps_limit.wait(frame_start);
        next_frame().await;
    }
}

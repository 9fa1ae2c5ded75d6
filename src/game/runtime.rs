//! Game Runtime
//!
//! Host-side glue around a session: frame pacing, per-phase timings, and
//! mapping keyboard and mouse state to `PlayerInput` plus one-shot host
//! actions (pause, respawn, map, quit).

use macroquad::prelude::*;

use super::camera::GameCamera;
use super::renderer::world_camera;
use super::ship::PlayerInput;

/// Frame timing data for performance profiling
#[derive(Debug, Clone, Default)]
pub struct FrameTimings {
    /// Input handling time (ms)
    pub input_ms: f32,
    /// Simulation time (ms)
    pub logic_ms: f32,
    /// Drawing time (ms)
    pub render_ms: f32,
    /// Total frame time (ms)
    pub total_ms: f32,
}

impl FrameTimings {
    /// Start timing a phase (returns time in seconds from macroquad)
    pub fn start() -> f64 {
        get_time()
    }

    /// Get elapsed time in ms since start
    pub fn elapsed_ms(start: f64) -> f32 {
        ((get_time() - start) * 1000.0) as f32
    }
}

/// FPS limit setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpsLimit {
    /// 30 FPS
    Fps30,
    /// 60 FPS (matches the fixed simulation step)
    #[default]
    Fps60,
    /// Unlocked (as fast as possible)
    Unlocked,
}

impl FpsLimit {
    /// Get the target frame time in seconds (None = unlocked)
    pub fn frame_time(&self) -> Option<f64> {
        match self {
            FpsLimit::Fps30 => Some(1.0 / 30.0),
            FpsLimit::Fps60 => Some(1.0 / 60.0),
            FpsLimit::Unlocked => None,
        }
    }

    /// Cycle to next value
    pub fn next(self) -> Self {
        match self {
            FpsLimit::Fps30 => FpsLimit::Fps60,
            FpsLimit::Fps60 => FpsLimit::Unlocked,
            FpsLimit::Unlocked => FpsLimit::Fps30,
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            FpsLimit::Fps30 => "30",
            FpsLimit::Fps60 => "60",
            FpsLimit::Unlocked => "Unlocked",
        }
    }

    /// Sleep off whatever is left of this frame's budget
    pub fn wait(&self, frame_start: f64) {
        let Some(target_frame_time) = self.frame_time() else {
            return;
        };
        // Native: use sleep for bulk, then spin-wait for precision
        #[cfg(not(target_arch = "wasm32"))]
        {
            let spin_margin = 0.002;
            while get_time() - frame_start + spin_margin < target_frame_time {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            while get_time() - frame_start < target_frame_time {
                std::hint::spin_loop();
            }
        }
        // WASM: the browser paces frames
        #[cfg(target_arch = "wasm32")]
        let _ = frame_start;
    }
}

/// One-shot requests to the host, read on key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    TogglePause,
    Respawn,
    Transcend,
    Land,
    ToggleMap,
    MapZoomIn,
    MapZoomOut,
    CycleFpsLimit,
    Quit,
}

const ACTION_KEYS: [(KeyCode, HostAction); 10] = [
    (KeyCode::P, HostAction::TogglePause),
    (KeyCode::R, HostAction::Respawn),
    (KeyCode::T, HostAction::Transcend),
    (KeyCode::L, HostAction::Land),
    (KeyCode::M, HostAction::ToggleMap),
    (KeyCode::Tab, HostAction::ToggleMap),
    (KeyCode::Equal, HostAction::MapZoomIn),
    (KeyCode::Minus, HostAction::MapZoomOut),
    (KeyCode::F, HostAction::CycleFpsLimit),
    (KeyCode::Escape, HostAction::Quit),
];

/// Host actions whose key went down this frame
pub fn read_actions() -> Vec<HostAction> {
    ACTION_KEYS
        .iter()
        .filter(|(key, _)| is_key_pressed(*key))
        .map(|(_, action)| *action)
        .collect()
}

/// Flight controls for this frame. With mouse control the ship turns toward
/// the cursor and the mouse buttons fire.
pub fn read_input(mouse_control: bool, camera: &GameCamera) -> PlayerInput {
    let down = |keys: &[KeyCode]| keys.iter().any(|k| is_key_down(*k));

    let mut input = PlayerInput {
        thrust: down(&[KeyCode::W, KeyCode::Up]),
        turn_left: down(&[KeyCode::A, KeyCode::Left]),
        turn_right: down(&[KeyCode::D, KeyCode::Right]),
        fire_primary: down(&[KeyCode::Space]),
        fire_secondary: down(&[KeyCode::LeftControl, KeyCode::E]),
        ability: is_key_pressed(KeyCode::Q),
        aim: None,
    };

    if mouse_control {
        let cursor: Vec2 = mouse_position().into();
        input.aim = Some(world_camera(camera).screen_to_world(cursor));
        input.fire_primary |= is_mouse_button_down(MouseButton::Left);
        input.fire_secondary |= is_mouse_button_down(MouseButton::Right);
    }
    input
}

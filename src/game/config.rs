//! Simulation Constants and Settings
//!
//! Fixed tuning values live here as constants. Values a player may want to
//! change between runs are in `SimSettings`, stored as RON next to the saves.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::save::SaveError;

// =============================================================================
// Timing
// =============================================================================

/// Logical time step of one frame, before time-factor scaling
pub const REAL_TIME_STEP: f32 = 1.0 / 60.0;

// =============================================================================
// World
// =============================================================================

/// Radius around a star where nothing may be placed
pub const SUN_HOT_RADIUS: f32 = 18.0;

/// Impulse below which a contact does not hurt anyone
pub const CRASH_IMPULSE_THRESHOLD: f32 = 1.5;

/// Damage per unit of impulse above the threshold
pub const CRASH_DAMAGE_FACTOR: f32 = 4.0;

// =============================================================================
// Projectiles
// =============================================================================

/// Homing projectiles ignore heading errors smaller than this (2 degrees)
pub const MIN_ANGLE_TO_GUIDE: f32 = 2.0 * std::f32::consts::PI / 180.0;

// =============================================================================
// Respawn
// =============================================================================

/// Share of money kept after death
pub const RESPAWN_MONEY_RATIO: f32 = 0.75;

/// Chance that an unequipped item survives death
pub const ITEM_RETAIN_CHANCE: f64 = 0.75;

/// Starting money in tutorial sessions
pub const TUTORIAL_MONEY: f32 = 200.0;

/// Settings file name inside the save directory
pub const SETTINGS_FILE: &str = "settings.ron";

/// Per-run settings, persisted as RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Global speed multiplier (debug); 1.0 = real time
    pub game_speed_multiplier: f32,
    /// Tutorial sessions skip saving and start with fixed money
    pub tutorial: bool,
    /// Aim the hero ship with the mouse instead of the keyboard
    pub mouse_control: bool,
    /// Far objects closer than this to the camera become live
    pub sim_radius: f32,
    /// Live objects farther than this from the camera become far
    pub far_radius: f32,
    /// Ship configuration used for new games
    pub starting_ship: String,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            game_speed_multiplier: 1.0,
            tutorial: false,
            mouse_control: false,
            sim_radius: 30.0,
            far_radius: 40.0,
            starting_ship: "starter".to_string(),
        }
    }
}

impl SimSettings {
    /// Load settings from a RON file. Missing or broken files yield defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match ron::from_str(&text) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("ignoring malformed settings at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Like `load_or_default`, but a missing file is written out with the
    /// defaults so there is something to edit.
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            return Self::load_or_default(path);
        }
        let settings = Self::default();
        match settings.save(path) {
            Ok(()) => log::info!("wrote default settings to {}", path.display()),
            Err(e) => log::warn!("could not write settings to {}: {}", path.display(), e),
        }
        settings
    }

    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())?;
        fs::write(path, text)?;
        Ok(())
    }
}

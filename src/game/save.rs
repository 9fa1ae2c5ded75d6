//! Save Files
//!
//! Two records survive a session: the world seed (a `key=value` text file,
//! so the galaxy can be regenerated) and the hero ship (RON). Both live in
//! one save directory, by default under the platform data dir.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config::SETTINGS_FILE;
use super::item::{EquipState, Item};

pub const WORLD_FILE: &str = "world.txt";
pub const SHIP_FILE: &str = "ship.ron";

/// Error type for save file access
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
    /// Readable but missing something required
    Malformed(String),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SaveError {
    fn from(e: ron::error::SpannedError) -> Self {
        SaveError::Parse(e)
    }
}

impl From<ron::Error> for SaveError {
    fn from(e: ron::Error) -> Self {
        SaveError::Serialize(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Parse(e) => write!(f, "Parse error: {}", e),
            SaveError::Serialize(e) => write!(f, "Serialize error: {}", e),
            SaveError::Malformed(e) => write!(f, "Malformed save: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    #[serde(default)]
    pub equipped: EquipState,
}

/// The hero ship as written to disk. Item order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    pub hull: String,
    pub money: f32,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl ShipRecord {
    pub fn new(hull: &str, money: f32, items: &[Item]) -> Self {
        Self {
            hull: hull.to_string(),
            money,
            items: items
                .iter()
                .map(|item| ItemRecord {
                    id: item.id.clone(),
                    equipped: item.equipped,
                })
                .collect(),
        }
    }

    /// Loadout in catalog form
    pub fn loadout(&self) -> Vec<(String, EquipState)> {
        self.items.iter().map(|i| (i.id.clone(), i.equipped)).collect()
    }
}

/// Parse `key=value` lines; blank lines and `#` comments are skipped
fn parse_seed(text: &str) -> Result<u64, SaveError> {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() == "seed" {
            return value
                .trim()
                .parse()
                .map_err(|e| SaveError::Malformed(format!("bad seed '{}': {}", value.trim(), e)));
        }
    }
    Err(SaveError::Malformed("no seed entry".to_string()))
}

// =============================================================================
// Save manager
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaveManager {
    base_dir: PathBuf,
}

impl SaveManager {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<data dir>/starwake`, or the working directory if the platform has none
    pub fn default_location() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("starwake");
        Self::with_base_dir(base)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base_dir.join(SETTINGS_FILE)
    }

    fn ensure_dir(&self) -> Result<(), SaveError> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    pub fn save_world(&self, seed: u64) -> Result<(), SaveError> {
        self.ensure_dir()?;
        fs::write(self.base_dir.join(WORLD_FILE), format!("seed={}\n", seed))?;
        Ok(())
    }

    pub fn load_world(&self) -> Result<u64, SaveError> {
        let text = fs::read_to_string(self.base_dir.join(WORLD_FILE))?;
        parse_seed(&text)
    }

    pub fn save_ship(&self, record: &ShipRecord) -> Result<(), SaveError> {
        self.ensure_dir()?;
        let text = ron::ser::to_string_pretty(record, ron::ser::PrettyConfig::new())?;
        fs::write(self.base_dir.join(SHIP_FILE), text)?;
        Ok(())
    }

    pub fn load_ship(&self) -> Result<ShipRecord, SaveError> {
        let text = fs::read_to_string(self.base_dir.join(SHIP_FILE))?;
        Ok(ron::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::item::ItemKind;

    #[test]
    fn test_world_seed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let saves = SaveManager::with_base_dir(dir.path().join("nested"));
        saves.save_world(1234567890123).unwrap();
        assert_eq!(saves.load_world().unwrap(), 1234567890123);

        let text = fs::read_to_string(saves.base_dir().join(WORLD_FILE)).unwrap();
        assert_eq!(text.trim(), "seed=1234567890123");
    }

    #[test]
    fn test_seed_parsing_edge_cases() {
        assert_eq!(parse_seed("# comment\nname=x\n seed = 7 \n").unwrap(), 7);
        assert!(matches!(parse_seed("name=x"), Err(SaveError::Malformed(_))));
        assert!(matches!(parse_seed("seed=abc"), Err(SaveError::Malformed(_))));
    }

    #[test]
    fn test_missing_world_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let saves = SaveManager::with_base_dir(dir.path());
        assert!(matches!(saves.load_world(), Err(SaveError::Io(_))));
    }

    #[test]
    fn test_ship_record_keeps_item_order() {
        let dir = tempfile::tempdir().unwrap();
        let saves = SaveManager::with_base_dir(dir.path());
        let mut shield = Item::new("b", 1.0, ItemKind::Commodity);
        shield.equipped = EquipState::Primary;
        let items = vec![Item::new("c", 1.0, ItemKind::Commodity), shield, Item::new("a", 1.0, ItemKind::Commodity)];

        let record = ShipRecord::new("scout", 150.0, &items);
        saves.save_ship(&record).unwrap();
        let loaded = saves.load_ship().unwrap();

        assert_eq!(loaded, record);
        let ids: Vec<&str> = loaded.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(loaded.items[1].equipped, EquipState::Primary);
    }

    #[test]
    fn test_garbage_ship_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let saves = SaveManager::with_base_dir(dir.path());
        fs::write(dir.path().join(SHIP_FILE), "not ron at all {").unwrap();
        assert!(matches!(saves.load_ship(), Err(SaveError::Parse(_))));
    }
}

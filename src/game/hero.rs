//! Hero and Respawn State
//!
//! The hero is whatever the player currently is: a live ship, a
//! transcendent snapshot lifted out of its ship, or nothing at all. When the
//! hero dies (or asks to respawn) part of their money and items are kept
//! for the next ship.

use std::sync::Arc;

use rand::Rng;

use super::catalog::HullConfig;
use super::config::{ITEM_RETAIN_CHANCE, RESPAWN_MONEY_RATIO};
use super::entity::ObjectId;
use super::item::{Item, ItemContainer};
use super::ship::FarShip;

#[derive(Debug, Clone)]
pub enum Hero {
    /// Flying the ship with this id
    Alive(ObjectId),
    /// Out of the ship; the snapshot is what lands again
    Transcendent(FarShip),
    Dead,
}

impl Hero {
    pub fn is_alive(&self) -> bool {
        !matches!(self, Hero::Dead)
    }

    pub fn is_transcendent(&self) -> bool {
        matches!(self, Hero::Transcendent(_))
    }

    pub fn ship_id(&self) -> Option<ObjectId> {
        match self {
            Hero::Alive(id) => Some(*id),
            _ => None,
        }
    }
}

/// What the next hero ship inherits
#[derive(Debug, Clone, Default)]
pub struct RespawnState {
    pub money: f32,
    pub hull: Option<Arc<HullConfig>>,
    pub items: Vec<Item>,
    /// Set once the first death has been recorded
    pub player_respawned: bool,
}

impl RespawnState {
    /// Record the inheritance. Equipped items are always kept; a
    /// transcendent hero keeps everything. Returns the indices into `items`
    /// that were kept, in ascending order.
    pub fn record(
        &mut self,
        money: f32,
        hull: Arc<HullConfig>,
        items: &ItemContainer,
        transcendent: bool,
        rng: &mut impl Rng,
    ) -> Vec<usize> {
        self.money = money * RESPAWN_MONEY_RATIO;
        self.hull = Some(hull);
        self.items.clear();
        self.player_respawned = true;

        let mut kept = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let keep = transcendent || item.equipped.is_equipped() || rng.gen_bool(ITEM_RETAIN_CHANCE);
            if keep {
                self.items.push(item.clone());
                kept.push(index);
            }
        }
        kept
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

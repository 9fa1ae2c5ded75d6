//! Items and Inventory
//!
//! Everything a ship can carry: guns, shields, armor and trade goods.
//! An item knows whether (and where) it is equipped; the ship turns equipped
//! shields and armor into runtime state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::components::Armor;
use super::projectile::ProjectileConfig;

/// Where an item is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EquipState {
    #[default]
    None,
    /// Primary slot (the only slot for shields and armor)
    Primary,
    /// Second gun mount on dual-mount hulls
    Secondary,
}

impl EquipState {
    pub fn is_equipped(self) -> bool {
        self != EquipState::None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GunSpec {
    pub projectile: Arc<ProjectileConfig>,
    /// Seconds between shots
    pub reload: f32,
    /// Randomize muzzle speed slightly
    pub vary_speed: bool,
    pub shot_sound: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldSpec {
    pub max_life: f32,
    pub regen_rate: f32,
    pub idle_delay: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Gun(GunSpec),
    Shield(ShieldSpec),
    Armor(Armor),
    Commodity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Catalog id, also what gets saved
    pub id: String,
    pub price: f32,
    pub kind: ItemKind,
    pub equipped: EquipState,
    /// Remaining reload time (guns only)
    pub cooldown: f32,
}

impl Item {
    pub fn new(id: impl Into<String>, price: f32, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            price,
            kind,
            equipped: EquipState::None,
            cooldown: 0.0,
        }
    }

    pub fn is_gun(&self) -> bool {
        matches!(self.kind, ItemKind::Gun(_))
    }

    pub fn is_equippable(&self) -> bool {
        !matches!(self.kind, ItemKind::Commodity)
    }

    /// Items that share a slot kind replace each other when equipped
    fn same_slot_kind(&self, other: &Item) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(&other.kind)
    }
}

/// An ordered bag of items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemContainer {
    items: Vec<Item>,
}

impl ItemContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Option<Item> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Mount the item at `index`. Whatever held that slot is unmounted.
    /// Returns false for items that cannot go there.
    pub fn equip(&mut self, index: usize, slot: EquipState, gun_slots: u8) -> bool {
        let Some(item) = self.items.get(index) else {
            return false;
        };
        if !item.is_equippable() || !slot.is_equipped() {
            return false;
        }
        if slot == EquipState::Secondary && (!item.is_gun() || gun_slots < 2) {
            return false;
        }

        let probe = item.clone();
        for other in &mut self.items {
            if other.same_slot_kind(&probe) && other.equipped == slot {
                other.equipped = EquipState::None;
            }
        }
        self.items[index].equipped = slot;
        true
    }

    /// Unmount the item at `index`. Returns whether it had been equipped.
    pub fn unequip(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) if item.equipped.is_equipped() => {
                item.equipped = EquipState::None;
                true
            }
            _ => false,
        }
    }

    pub fn equipped_shield(&self) -> Option<ShieldSpec> {
        self.items.iter().find_map(|item| match item.kind {
            ItemKind::Shield(spec) if item.equipped.is_equipped() => Some(spec),
            _ => None,
        })
    }

    pub fn equipped_armor(&self) -> Option<Armor> {
        self.items.iter().find_map(|item| match item.kind {
            ItemKind::Armor(armor) if item.equipped.is_equipped() => Some(armor),
            _ => None,
        })
    }

    /// Guns mounted in `slot`, with their indices
    pub fn guns_in(&self, slot: EquipState) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_gun() && item.equipped == slot)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.items.get_mut(index)
    }

    pub fn into_vec(self) -> Vec<Item> {
        self.items
    }
}

impl From<Vec<Item>> for ItemContainer {
    fn from(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gun(id: &str) -> Item {
        Item::new(
            id,
            10.0,
            ItemKind::Gun(GunSpec {
                projectile: Arc::new(ProjectileConfig::default()),
                reload: 0.5,
                vary_speed: false,
                shot_sound: None,
            }),
        )
    }

    fn shield() -> Item {
        Item::new(
            "shield",
            30.0,
            ItemKind::Shield(ShieldSpec {
                max_life: 20.0,
                regen_rate: 2.0,
                idle_delay: 3.0,
            }),
        )
    }

    #[test]
    fn test_equip_replaces_same_slot() {
        let mut items = ItemContainer::from(vec![gun("a"), gun("b"), shield()]);

        assert!(items.equip(0, EquipState::Primary, 2));
        assert!(items.equip(1, EquipState::Primary, 2));
        assert_eq!(items.items[0].equipped, EquipState::None);
        assert_eq!(items.guns_in(EquipState::Primary), vec![1]);

        // A shield in the primary slot does not bump the gun
        assert!(items.equip(2, EquipState::Primary, 2));
        assert_eq!(items.items[1].equipped, EquipState::Primary);
        assert!(items.equipped_shield().is_some());
    }

    #[test]
    fn test_secondary_needs_dual_mount() {
        let mut items = ItemContainer::from(vec![gun("a"), shield()]);
        assert!(!items.equip(0, EquipState::Secondary, 1));
        assert!(!items.equip(1, EquipState::Secondary, 2));
        assert!(items.equip(0, EquipState::Secondary, 2));
    }

    #[test]
    fn test_unequip_reports_previous_state() {
        let mut items = ItemContainer::from(vec![gun("a")]);
        assert!(!items.unequip(0));
        items.equip(0, EquipState::Primary, 1);
        assert!(items.unequip(0));
        assert!(!items.unequip(0));
    }

    #[test]
    fn test_commodities_never_equip() {
        let mut items = ItemContainer::from(vec![Item::new("ore", 5.0, ItemKind::Commodity)]);
        assert!(!items.equip(0, EquipState::Primary, 2));
    }
}

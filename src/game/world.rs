//! Live Object Storage and Update Context
//!
//! `ObjectStore` holds the live world objects in sparse slots indexed by
//! `ObjectId::index()`. During an update pass each object is checked out of
//! its slot, updated against a `World` view of everything else, then put
//! back, so an object can freely read and damage its neighbours.
//!
//! Nothing in the store changes shape while a pass is running. Spawns and
//! removals go into `PendingChanges` and are applied by the object manager
//! at a single point after every object has been updated.

use std::sync::Arc;

use macroquad::math::Vec2;
use rand::rngs::StdRng;

use super::entity::{IdAllocator, ObjectId};
use super::event::Events;
use super::faction::{are_enemies, Faction};
use super::loot::{Loot, LootContent};
use super::object::WorldObject;
use super::physics::PhysicsWorld;
use super::projectile::{Projectile, ProjectileConfig, ProjectileSpawn};
use super::ship::PlayerInput;

// =============================================================================
// Object Store
// =============================================================================

struct Slot {
    id: ObjectId,
    /// `None` while the object is checked out for its update
    object: Option<WorldObject>,
}

#[derive(Default)]
pub struct ObjectStore {
    /// Sparse array indexed by id.index()
    data: Vec<Option<Slot>>,
    /// Insertion order, which is also the update order
    order: Vec<ObjectId>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_capacity(&mut self, index: usize) {
        if index >= self.data.len() {
            self.data.resize_with(index + 1, || None);
        }
    }

    fn slot(&self, id: ObjectId) -> Option<&Slot> {
        self.data
            .get(id.index() as usize)
            .and_then(|s| s.as_ref())
            .filter(|s| s.id == id)
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut Slot> {
        self.data
            .get_mut(id.index() as usize)
            .and_then(|s| s.as_mut())
            .filter(|s| s.id == id)
    }

    pub fn insert(&mut self, id: ObjectId, object: WorldObject) {
        let idx = id.index() as usize;
        self.ensure_capacity(idx);
        if self.data[idx].is_none() {
            self.order.push(id);
        }
        self.data[idx] = Some(Slot {
            id,
            object: Some(object),
        });
    }

    /// Take an object out of its slot. Its id stays in the update order,
    /// skipped by iteration, until the next `compact`.
    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        let slot = self.data.get_mut(id.index() as usize)?;
        if slot.as_ref().map_or(true, |s| s.id != id) {
            return None;
        }
        slot.take().and_then(|s| s.object)
    }

    /// Drop every removed id from the update order in one pass
    pub fn compact(&mut self) {
        let data = &self.data;
        self.order.retain(|&id| {
            data.get(id.index() as usize)
                .and_then(|s| s.as_ref())
                .map_or(false, |s| s.id == id)
        });
    }

    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.slot(id).and_then(|s| s.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.slot_mut(id).and_then(|s| s.object.as_mut())
    }

    /// Check an object out for its update. The slot stays reserved.
    pub fn take(&mut self, id: ObjectId) -> Option<WorldObject> {
        self.slot_mut(id).and_then(|s| s.object.take())
    }

    pub fn put_back(&mut self, id: ObjectId, object: WorldObject) {
        if let Some(slot) = self.slot_mut(id) {
            slot.object = Some(object);
        }
    }

    /// True for live ids, including one currently checked out
    pub fn contains(&self, id: ObjectId) -> bool {
        self.slot(id).is_some()
    }

    /// Snapshot of live ids in update order
    pub fn ids(&self) -> Vec<ObjectId> {
        self.order.iter().copied().filter(|&id| self.contains(id)).collect()
    }

    /// Iterate over live objects that are not checked out
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &WorldObject)> {
        self.order
            .iter()
            .filter_map(move |&id| self.get(id).map(|object| (id, object)))
    }

    pub fn len(&self) -> usize {
        self.data.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|s| s.is_none())
    }

    /// Closest live ship or station hostile to `faction`
    pub fn nearest_enemy(&self, physics: &PhysicsWorld, faction: Faction, origin: Vec2) -> Option<Target> {
        let mut best: Option<Target> = None;
        for (id, object) in self.iter() {
            if !object.is_targetable() {
                continue;
            }
            let Some(other) = object.faction() else { continue };
            if !are_enemies(faction, other) {
                continue;
            }
            let position = object.position(physics);
            let distance = position.distance(origin);
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(Target {
                    id: Some(id),
                    position,
                    distance,
                });
            }
        }
        best
    }
}

/// Result of a nearest-enemy query. Far targets have no id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: Option<ObjectId>,
    pub position: Vec2,
    pub distance: f32,
}

// =============================================================================
// Deferred changes
// =============================================================================

/// Why an object leaves the live set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Its own `should_be_removed` said so
    Destroyed,
    /// Someone called `remove_deferred`
    Requested,
    /// Moved out of simulation range
    ToFar,
}

#[derive(Default)]
pub struct PendingChanges {
    additions: Vec<(ObjectId, WorldObject)>,
    removals: Vec<(ObjectId, RemovalReason)>,
}

impl PendingChanges {
    pub fn add(&mut self, id: ObjectId, object: WorldObject) {
        self.additions.push((id, object));
    }

    /// Queue a removal; the first reason given for an id wins
    pub fn remove(&mut self, id: ObjectId, reason: RemovalReason) {
        if !self.removals.iter().any(|(r, _)| *r == id) {
            self.removals.push((id, reason));
        }
    }

    /// An object waiting to be added
    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.additions
            .iter_mut()
            .find(|(a, _)| *a == id)
            .map(|(_, object)| object)
    }

    pub fn find(&self, id: ObjectId) -> Option<&WorldObject> {
        self.additions.iter().find(|(a, _)| *a == id).map(|(_, object)| object)
    }

    pub fn take_removals(&mut self) -> Vec<(ObjectId, RemovalReason)> {
        std::mem::take(&mut self.removals)
    }

    pub fn take_additions(&mut self) -> Vec<(ObjectId, WorldObject)> {
        std::mem::take(&mut self.additions)
    }
}

// =============================================================================
// Update context
// =============================================================================

/// Everything an object may touch while it updates.
pub struct World<'a> {
    /// The object being updated (or removed)
    pub self_id: ObjectId,
    pub time_step: f32,
    pub physics: &'a mut PhysicsWorld,
    /// Live objects, minus the one checked out
    pub objects: &'a mut ObjectStore,
    pub pending: &'a mut PendingChanges,
    pub ids: &'a mut IdAllocator,
    pub events: &'a mut Events,
    pub rng: &'a mut StdRng,
    pub input: &'a PlayerInput,
}

impl<'a> World<'a> {
    /// Reserve an id so a body can be tagged before the object exists
    pub fn reserve_id(&mut self) -> ObjectId {
        self.ids.allocate()
    }

    /// Becomes live after the current pass
    pub fn add_deferred(&mut self, id: ObjectId, object: WorldObject) {
        self.pending.add(id, object);
    }

    /// Leaves the live set after the current pass
    pub fn remove_deferred(&mut self, id: ObjectId) {
        self.pending.remove(id, RemovalReason::Requested);
    }

    pub fn nearest_enemy(&self, faction: Faction, origin: Vec2) -> Option<Target> {
        self.objects.nearest_enemy(self.physics, faction, origin)
    }

    pub fn spawn_projectile(&mut self, config: Arc<ProjectileConfig>, spawn: ProjectileSpawn) -> ObjectId {
        let id = self.reserve_id();
        let projectile = Projectile::new(id, config, spawn, self.physics, self.events, &mut *self.rng);
        self.add_deferred(id, WorldObject::Projectile(projectile));
        id
    }

    pub fn spawn_loot(&mut self, content: LootContent, position: Vec2, velocity: Vec2) -> ObjectId {
        let id = self.reserve_id();
        let loot = Loot::new(id, content, position, velocity, self.physics);
        self.add_deferred(id, WorldObject::Loot(loot));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::asteroid::Asteroid;

    fn rock(physics: &mut PhysicsWorld, ids: &mut IdAllocator, x: f32) -> (ObjectId, WorldObject) {
        let id = ids.allocate();
        let asteroid = Asteroid::new(id, Vec2::new(x, 0.0), Vec2::ZERO, 0.5, physics);
        (id, WorldObject::Asteroid(asteroid))
    }

    #[test]
    fn test_checkout_hides_object() {
        let mut physics = PhysicsWorld::new();
        let mut ids = IdAllocator::new();
        let mut store = ObjectStore::new();
        let (a, rock_a) = rock(&mut physics, &mut ids, 0.0);
        let (b, rock_b) = rock(&mut physics, &mut ids, 5.0);
        store.insert(a, rock_a);
        store.insert(b, rock_b);

        let taken = store.take(a).unwrap();
        assert!(store.contains(a));
        assert!(store.get(a).is_none());
        assert_eq!(store.iter().count(), 1);

        store.put_back(a, taken);
        assert_eq!(store.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_stale_id_does_not_resolve() {
        let mut physics = PhysicsWorld::new();
        let mut ids = IdAllocator::new();
        let mut store = ObjectStore::new();

        let (old, rock_old) = rock(&mut physics, &mut ids, 0.0);
        store.insert(old, rock_old);
        store.remove(old);
        ids.free(old);

        let (new, rock_new) = rock(&mut physics, &mut ids, 0.0);
        store.insert(new, rock_new);
        assert_eq!(new.index(), old.index());
        assert!(store.get(old).is_none());
        assert!(store.get(new).is_some());
        assert!(store.remove(old).is_none());
    }

    #[test]
    fn test_batch_removal_keeps_update_order() {
        let mut physics = PhysicsWorld::new();
        let mut ids = IdAllocator::new();
        let mut store = ObjectStore::new();
        let mut all = Vec::new();
        for i in 0..6 {
            let (id, object) = rock(&mut physics, &mut ids, i as f32 * 3.0);
            store.insert(id, object);
            all.push(id);
        }

        for &id in &[all[1], all[4], all[2]] {
            assert!(store.remove(id).is_some());
        }
        // Removed ids are skipped before the order is compacted
        assert_eq!(store.ids(), vec![all[0], all[3], all[5]]);
        assert_eq!(store.len(), 3);

        store.compact();
        assert_eq!(store.order, vec![all[0], all[3], all[5]]);
        assert_eq!(store.iter().map(|(id, _)| id).collect::<Vec<_>>(), store.ids());
    }

    #[test]
    fn test_pending_removal_first_reason_wins() {
        let mut pending = PendingChanges::default();
        let id = ObjectId::new(0, 0);
        pending.remove(id, RemovalReason::ToFar);
        pending.remove(id, RemovalReason::Requested);
        assert_eq!(pending.take_removals(), vec![(id, RemovalReason::ToFar)]);
    }

    #[test]
    fn test_nearest_enemy_on_empty_store() {
        let physics = PhysicsWorld::new();
        let store = ObjectStore::new();
        assert!(store.nearest_enemy(&physics, Faction::Friendly, Vec2::ZERO).is_none());
    }
}

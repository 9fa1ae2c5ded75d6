//! Object Manager
//!
//! Owns every simulated object plus the far set, and runs the frame:
//! gravity, physics step, contact dispatch, the update pass, range
//! streaming, then the single synchronization point where queued removals
//! and additions are applied (removals first).

use macroquad::math::Vec2;
use rand::rngs::StdRng;

use super::contact;
use super::drawable::Drawable;
use super::entity::{IdAllocator, ObjectId};
use super::event::Events;
use super::faction::{are_enemies, Faction};
use super::object::{FarObject, WorldObject};
use super::physics::PhysicsWorld;
use super::planet::PlanetManager;
use super::ship::PlayerInput;
use super::world::{ObjectStore, PendingChanges, RemovalReason, Target, World};

/// An object that left the live set this frame
#[derive(Debug)]
pub struct Removed {
    pub id: ObjectId,
    pub reason: RemovalReason,
    pub object: WorldObject,
}

/// Per-frame inputs the manager does not own
pub struct FrameInput<'a> {
    pub time_step: f32,
    /// Streaming centre
    pub camera: Vec2,
    pub player: &'a PlayerInput,
    pub planets: &'a PlanetManager,
    pub rng: &'a mut StdRng,
}

pub struct ObjectManager {
    physics: PhysicsWorld,
    objects: ObjectStore,
    far: Vec<FarObject>,
    pending: PendingChanges,
    ids: IdAllocator,
    events: Events,
    /// Far objects inside this radius become live
    sim_radius: f32,
    /// Live objects outside this radius go far
    far_radius: f32,
}

impl ObjectManager {
    pub fn new(sim_radius: f32, far_radius: f32) -> Self {
        Self {
            physics: PhysicsWorld::new(),
            objects: ObjectStore::new(),
            far: Vec::new(),
            pending: PendingChanges::default(),
            ids: IdAllocator::new(),
            events: Events::new(),
            sim_radius,
            far_radius: far_radius.max(sim_radius),
        }
    }

    // =========================================================================
    // Frame
    // =========================================================================

    pub fn update(&mut self, frame: FrameInput) -> Vec<Removed> {
        let FrameInput {
            time_step,
            camera,
            player,
            planets,
            rng,
        } = frame;

        self.apply_gravity(planets, time_step);
        self.physics.step(time_step);
        let contacts = self.physics.drain_contacts();
        contact::dispatch(contacts, &self.physics, &mut self.objects, &mut self.events);

        // Update pass: each object is checked out while it runs
        for id in self.objects.ids() {
            let Some(mut object) = self.objects.take(id) else { continue };
            let mut world = World {
                self_id: id,
                time_step,
                physics: &mut self.physics,
                objects: &mut self.objects,
                pending: &mut self.pending,
                ids: &mut self.ids,
                events: &mut self.events,
                rng: &mut *rng,
                input: player,
            };
            object.update(&mut world);
            self.objects.put_back(id, object);
        }

        for (id, object) in self.objects.iter() {
            if object.should_be_removed() {
                self.pending.remove(id, RemovalReason::Destroyed);
            }
        }

        self.stream(camera, time_step);
        self.apply_pending(time_step, player, rng)
    }

    fn apply_gravity(&mut self, planets: &PlanetManager, time_step: f32) {
        for id in self.objects.ids() {
            let Some(object) = self.objects.get_mut(id) else { continue };
            if !object.receives_gravity() {
                continue;
            }
            let pull = planets.gravity_at(object.position(&self.physics));
            if pull != Vec2::ZERO {
                object.receive_force(&mut self.physics, pull, time_step, true);
            }
        }
    }

    /// Queue range transitions in both directions
    fn stream(&mut self, camera: Vec2, time_step: f32) {
        for (id, object) in self.objects.iter() {
            if object.position(&self.physics).distance(camera) <= self.far_radius {
                continue;
            }
            let reason = if object.to_far(&self.physics).is_some() {
                RemovalReason::ToFar
            } else {
                RemovalReason::Requested
            };
            self.pending.remove(id, reason);
        }

        let mut index = 0;
        while index < self.far.len() {
            self.far[index].advance(time_step);
            if self.far[index].position().distance(camera) < self.sim_radius {
                let far = self.far.swap_remove(index);
                let id = self.ids.allocate();
                let object = far.to_object(id, &mut self.physics);
                self.pending.add(id, object);
            } else {
                index += 1;
            }
        }
    }

    fn apply_pending(&mut self, time_step: f32, player: &PlayerInput, rng: &mut StdRng) -> Vec<Removed> {
        let mut removed = Vec::new();
        let mut deferred = Vec::new();

        for (id, reason) in self.pending.take_removals() {
            let Some(mut object) = self.objects.remove(id) else {
                // Not live yet; try again once it has been added
                if self.pending.find(id).is_some() {
                    deferred.push((id, reason));
                }
                continue;
            };
            // Snapshot before the body goes away
            if reason == RemovalReason::ToFar {
                if let Some(far) = object.to_far(&self.physics) {
                    self.far.push(far);
                }
            }
            let mut world = World {
                self_id: id,
                time_step,
                physics: &mut self.physics,
                objects: &mut self.objects,
                pending: &mut self.pending,
                ids: &mut self.ids,
                events: &mut self.events,
                rng: &mut *rng,
                input: player,
            };
            object.on_remove(&mut world, reason);
            self.ids.free(id);
            removed.push(Removed { id, reason, object });
        }
        self.objects.compact();

        for (id, object) in self.pending.take_additions() {
            self.objects.insert(id, object);
        }
        for (id, reason) in deferred {
            self.pending.remove(id, reason);
        }
        removed
    }

    // =========================================================================
    // Deferred changes
    // =========================================================================

    /// Reserve an id so a body can be tagged before the object exists
    pub fn reserve_id(&mut self) -> ObjectId {
        self.ids.allocate()
    }

    pub fn add_deferred(&mut self, id: ObjectId, object: WorldObject) {
        self.pending.add(id, object);
    }

    pub fn remove_deferred(&mut self, id: ObjectId) {
        self.pending.remove(id, RemovalReason::Requested);
    }

    /// Reserve an id, build the object against the physics world and queue it
    pub fn spawn(&mut self, build: impl FnOnce(ObjectId, &mut PhysicsWorld) -> WorldObject) -> ObjectId {
        let id = self.reserve_id();
        let object = build(id, &mut self.physics);
        self.add_deferred(id, object);
        id
    }

    pub fn add_far(&mut self, far: FarObject) {
        self.far.push(far);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live object, or one waiting to be added
    pub fn find(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(id).or_else(|| self.pending.find(id))
    }

    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        if self.objects.contains(id) {
            return self.objects.get_mut(id);
        }
        self.pending.find_mut(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &WorldObject)> {
        self.objects.iter()
    }

    pub fn far_objects(&self) -> &[FarObject] {
        &self.far
    }

    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    pub fn position_of(&self, id: ObjectId) -> Option<Vec2> {
        self.find(id).map(|o| o.position(&self.physics))
    }

    /// Closest hostile ship or station. Far objects count when asked.
    pub fn nearest_enemy(&self, faction: Faction, origin: Vec2, include_far: bool) -> Option<Target> {
        let mut best = self.objects.nearest_enemy(&self.physics, faction, origin);
        if include_far {
            for far in &self.far {
                if !far.is_targetable() {
                    continue;
                }
                let Some(other) = far.faction() else { continue };
                if !are_enemies(faction, other) {
                    continue;
                }
                let distance = far.position().distance(origin);
                if best.as_ref().map_or(true, |b| distance < b.distance) {
                    best = Some(Target {
                        id: None,
                        position: far.position(),
                        distance,
                    });
                }
            }
        }
        best
    }

    /// Safe-spawn test: clear of planets (when asked), stars and every body
    pub fn is_place_empty(&self, position: Vec2, consider_planets: bool, planets: &PlanetManager) -> bool {
        if consider_planets && planets.is_inside_planet(position) {
            return false;
        }
        if planets.is_inside_sun(position) {
            return false;
        }
        for (_, object) in self.objects.iter() {
            if !object.has_body() {
                continue;
            }
            let profile = object.profile(&self.physics);
            if position.distance(profile.position) < profile.radius {
                return false;
            }
        }
        self.far
            .iter()
            .all(|far| position.distance(far.position()) >= far.radius())
    }

    pub fn drawables(&self, time_step: f32) -> Vec<Drawable> {
        self.objects
            .iter()
            .flat_map(|(_, object)| object.drawables(&self.physics, time_step))
            .collect()
    }

    /// Drop everything, live and far
    pub fn dispose(&mut self) {
        if !self.objects.is_empty() || !self.far.is_empty() {
            log::debug!("disposing {} live and {} far objects", self.objects.len(), self.far.len());
        }
        self.physics = PhysicsWorld::new();
        self.objects = ObjectStore::new();
        self.far.clear();
        self.pending = PendingChanges::default();
        self.ids = IdAllocator::new();
        self.events.clear_all();
    }
}

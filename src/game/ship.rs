//! Ships
//!
//! A ship is a rapier body with a solid hull collider and a larger sensor
//! ring for its shield. Damage goes through the shield first, then armor,
//! and what remains comes off the hull. Either the player or a simple AI
//! flies it. EMP hits lock the controls for a while.

use std::f32::consts::TAU;
use std::sync::Arc;

use macroquad::color::{Color, WHITE};
use macroquad::math::Vec2;
use rand::Rng;
use rapier2d::prelude::RigidBodyHandle;

use super::catalog::HullConfig;
use super::components::{Armor, DamageType, Health, ShieldState, SloMo};
use super::config::REAL_TIME_STEP;
use super::drawable::Drawable;
use super::entity::ObjectId;
use super::event::{EffectEvent, Events, SoundEvent};
use super::faction::Faction;
use super::item::{EquipState, Item, ItemContainer, ItemKind};
use super::loot::LootContent;
use super::object::{ContactProfile, ObjectKind};
use super::physics::{BodyDesc, ColliderMode, ColliderTag, PhysicsWorld};
use super::projectile::{angle_of, normalize_angle, ProjectileSpawn};
use super::world::{RemovalReason, World};

/// Speed of dropped items relative to the wreck
const LOOT_SCATTER_SPEED: f32 = 0.6;

/// Raw player controls for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub thrust: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub fire_primary: bool,
    pub fire_secondary: bool,
    pub ability: bool,
    /// World-space aim point when flying with the mouse
    pub aim: Option<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pilot {
    Player,
    Ai {
        /// Enemies farther than this are ignored
        detection_range: f32,
    },
}

/// What the pilot wants this frame, after input mapping
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Controls {
    thrust: bool,
    /// -1 = clockwise .. 1 = counter-clockwise, scaled by hull turn speed
    turn: f32,
    fire_primary: bool,
    fire_secondary: bool,
    ability: bool,
}

/// Turn input that steers `current` toward `desired` without overshooting
fn steer(current: f32, desired: f32, rot_speed: f32, time_step: f32) -> f32 {
    let diff = normalize_angle(desired - current);
    let max = rot_speed * time_step;
    if max <= 0.0 {
        return 0.0;
    }
    (diff / max).clamp(-1.0, 1.0)
}

pub struct Ship {
    hull: Arc<HullConfig>,
    faction: Faction,
    pilot: Pilot,
    body: RigidBodyHandle,
    health: Health,
    shield: Option<ShieldState>,
    armor: Option<Armor>,
    money: f32,
    items: ItemContainer,
    ability: Option<SloMo>,
    /// Seconds left with controls locked
    controls_disabled: f32,
    /// Whether the engine fired last frame (for drawing)
    thrusting: bool,
}

/// Everything needed to put a ship into the world
#[derive(Debug, Clone)]
pub struct ShipSpawn {
    pub hull: Arc<HullConfig>,
    pub faction: Faction,
    pub pilot: Pilot,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub money: f32,
    /// Equip marks on the items are honoured
    pub items: Vec<Item>,
    /// `None` = full health
    pub health: Option<f32>,
}

impl Ship {
    pub fn build(id: ObjectId, spawn: ShipSpawn, physics: &mut PhysicsWorld) -> Self {
        let mut desc = BodyDesc::dynamic(spawn.position, spawn.angle, spawn.velocity);
        desc.lock_rotation = true;
        let body = physics.create_body(desc);
        physics.add_ball_collider(body, spawn.hull.radius, spawn.hull.density, ColliderTag::hull(id), ColliderMode::Solid);
        physics.add_ball_collider(body, spawn.hull.shield_radius(), 0.0, ColliderTag::shield(id), ColliderMode::Sensor);

        let mut health = Health::new(spawn.hull.max_health);
        if let Some(current) = spawn.health {
            health.current = current.clamp(0.0, health.max);
        }
        let ability = spawn.hull.ability.map(|a| SloMo::new(a.factor, a.duration, a.recharge));

        let mut ship = Self {
            hull: spawn.hull,
            faction: spawn.faction,
            pilot: spawn.pilot,
            body,
            health,
            shield: None,
            armor: None,
            money: spawn.money,
            items: ItemContainer::new(),
            ability,
            controls_disabled: 0.0,
            thrusting: false,
        };

        // Re-equip through the container so slot rules hold
        for item in spawn.items {
            let slot = item.equipped;
            let mut item = item;
            item.equipped = EquipState::None;
            ship.items.add(item);
            if slot.is_equipped() {
                let index = ship.items.len() - 1;
                ship.items.equip(index, slot, ship.hull.gun_slots);
            }
        }
        ship.refresh_equipment();
        ship
    }

    /// Rebuild shield and armor state from the equipped items
    fn refresh_equipment(&mut self) {
        self.shield = self
            .items
            .equipped_shield()
            .map(|spec| ShieldState::new(spec.max_life, spec.regen_rate, spec.idle_delay));
        self.armor = self.items.equipped_armor();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn hull(&self) -> &Arc<HullConfig> {
        &self.hull
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn is_player(&self) -> bool {
        self.pilot == Pilot::Player
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn shield(&self) -> Option<&ShieldState> {
        self.shield.as_ref()
    }

    pub fn money(&self) -> f32 {
        self.money
    }

    pub fn set_money(&mut self, money: f32) {
        self.money = money;
    }

    pub fn items(&self) -> &ItemContainer {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemContainer {
        &mut self.items
    }

    /// Unequip the item at `index`. Returns whether it had been equipped.
    pub fn maybe_unequip(&mut self, index: usize) -> bool {
        let was = self.items.unequip(index);
        if was {
            self.refresh_equipment();
        }
        was
    }

    /// Time factor the ship's active ability imposes on the world
    pub fn time_factor(&self) -> f32 {
        self.ability.as_ref().map_or(1.0, |a| a.time_factor())
    }

    pub fn controls_disabled(&self) -> bool {
        self.controls_disabled > 0.0
    }

    pub fn disable_controls(&mut self, duration: f32) {
        self.controls_disabled = self.controls_disabled.max(duration);
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        physics.position(self.body)
    }

    pub fn velocity(&self, physics: &PhysicsWorld) -> Vec2 {
        physics.velocity(self.body)
    }

    pub fn angle(&self, physics: &PhysicsWorld) -> f32 {
        physics.angle(self.body)
    }

    pub fn should_be_removed(&self) -> bool {
        self.health.is_dead()
    }

    pub fn profile(&self, physics: &PhysicsWorld) -> ContactProfile {
        ContactProfile {
            kind: ObjectKind::Ship,
            faction: Some(self.faction),
            position: self.position(physics),
            radius: self.hull.radius,
            has_shape: true,
            shield_radius: Some(self.hull.shield_radius()),
            shield_up: self.shield.as_ref().map_or(false, |s| s.is_up()),
        }
    }

    // =========================================================================
    // Update
    // =========================================================================

    pub fn update(&mut self, world: &mut World) {
        let time_step = world.time_step;
        self.controls_disabled = (self.controls_disabled - time_step).max(0.0);
        if let Some(shield) = &mut self.shield {
            shield.update(time_step);
        }
        if let Some(ability) = &mut self.ability {
            ability.update(REAL_TIME_STEP);
        }
        for item in self.items.iter_mut() {
            item.cooldown = (item.cooldown - time_step).max(0.0);
        }

        let controls = if self.controls_disabled() {
            Controls::default()
        } else {
            match self.pilot {
                Pilot::Player => self.player_controls(world),
                Pilot::Ai { detection_range } => self.ai_controls(world, detection_range),
            }
        };

        self.apply_controls(controls, world);
    }

    fn player_controls(&self, world: &World) -> Controls {
        let input = world.input;
        let turn = match input.aim {
            Some(aim) => {
                let position = self.position(world.physics);
                let desired = angle_of(aim - position);
                steer(self.angle(world.physics), desired, self.hull.rot_speed, world.time_step)
            }
            None => match (input.turn_left, input.turn_right) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            },
        };
        Controls {
            thrust: input.thrust,
            turn,
            fire_primary: input.fire_primary,
            fire_secondary: input.fire_secondary,
            ability: input.ability,
        }
    }

    fn ai_controls(&self, world: &World, detection_range: f32) -> Controls {
        let position = self.position(world.physics);
        let Some(target) = world.nearest_enemy(self.faction, position) else {
            return Controls::default();
        };
        if target.distance > detection_range {
            return Controls::default();
        }
        let desired = angle_of(target.position - position);
        let current = self.angle(world.physics);
        let aligned = normalize_angle(desired - current).abs() < 0.2;
        Controls {
            thrust: target.distance > detection_range * 0.4,
            turn: steer(current, desired, self.hull.rot_speed, world.time_step),
            fire_primary: aligned,
            fire_secondary: aligned && target.distance < detection_range * 0.5,
            ability: false,
        }
    }

    fn apply_controls(&mut self, controls: Controls, world: &mut World) {
        let time_step = world.time_step;

        if controls.turn != 0.0 {
            let angle = self.angle(world.physics) + controls.turn * self.hull.rot_speed * time_step;
            world.physics.set_angle(self.body, normalize_angle(angle));
        }

        self.thrusting = controls.thrust;
        if controls.thrust {
            let dir = Vec2::from_angle(self.angle(world.physics));
            world.physics.accelerate(self.body, dir * self.hull.thrust, time_step);
            let velocity = world.physics.velocity(self.body);
            if velocity.length() > self.hull.max_speed {
                world.physics.set_velocity(self.body, velocity.clamp_length_max(self.hull.max_speed));
            }
        }

        if controls.ability {
            if let Some(ability) = &mut self.ability {
                if ability.activate() {
                    log::info!("slow motion engaged");
                }
            }
        }

        if controls.fire_primary {
            self.fire(EquipState::Primary, world);
        }
        if controls.fire_secondary {
            self.fire(EquipState::Secondary, world);
        }
    }

    fn fire(&mut self, slot: EquipState, world: &mut World) {
        let position = self.position(world.physics);
        let velocity = self.velocity(world.physics);
        let angle = self.angle(world.physics);
        let muzzle_pos = position + Vec2::from_angle(angle) * (self.hull.radius + 0.05);

        for index in self.items.guns_in(slot) {
            let Some(item) = self.items.get_mut(index) else { continue };
            if item.cooldown > 0.0 {
                continue;
            }
            let ItemKind::Gun(gun) = &item.kind else { continue };
            item.cooldown = gun.reload;
            let config = gun.projectile.clone();
            let sound = gun.shot_sound.clone();
            let spawn = ProjectileSpawn {
                angle,
                muzzle_pos,
                gun_velocity: velocity,
                faction: self.faction,
                vary_speed: gun.vary_speed,
            };
            world.spawn_projectile(config, spawn);
            if let Some(sound) = sound {
                world.events.sounds.send(SoundEvent {
                    sound,
                    position: muzzle_pos,
                    source: Some(world.self_id),
                });
            }
        }
    }

    // =========================================================================
    // Damage and removal
    // =========================================================================

    /// Shield, then armor, then hull
    pub fn receive_damage(&mut self, amount: f32, position: Vec2, dmg_type: DamageType, events: &mut Events) {
        if self.health.is_dead() {
            return;
        }
        let mut remaining = amount;
        if let Some(shield) = &mut self.shield {
            let before = remaining;
            remaining = shield.absorb(remaining, dmg_type);
            if remaining < before {
                events.sounds.send(SoundEvent {
                    sound: "shield-hit".to_string(),
                    position,
                    source: None,
                });
            }
        }
        if let Some(armor) = &self.armor {
            remaining = armor.reduce(remaining, dmg_type);
        }
        if remaining > 0.0 && self.health.damage(remaining) {
            log::debug!("{} ship destroyed by {:?}", self.hull.id, dmg_type);
        }
    }

    pub fn receive_force(&mut self, physics: &mut PhysicsWorld, force: Vec2, time_step: f32, is_acceleration: bool) {
        if is_acceleration {
            physics.accelerate(self.body, force, time_step);
        } else {
            physics.apply_impulse(self.body, force * time_step);
        }
    }

    /// Pick up loot
    pub fn collect(&mut self, content: LootContent) {
        match content {
            LootContent::Money(amount) => self.money += amount,
            LootContent::Item(item) => self.items.add(item),
        }
    }

    pub fn on_remove(&mut self, world: &mut World, reason: RemovalReason) {
        let position = self.position(world.physics);
        let velocity = self.velocity(world.physics);
        if reason != RemovalReason::ToFar && self.health.is_dead() {
            world.events.effects.send(EffectEvent::Explosion {
                position,
                size: self.hull.radius * 2.0,
            });
            world.events.sounds.send(SoundEvent {
                sound: "explosion".to_string(),
                position,
                source: None,
            });
            if !self.is_player() {
                self.drop_cargo(world, position, velocity * 0.5);
            }
        }
        world.physics.remove_body(self.body);
    }

    /// Scatter money and every carried item as loot
    fn drop_cargo(&mut self, world: &mut World, position: Vec2, velocity: Vec2) {
        if self.money > 0.0 {
            world.spawn_loot(LootContent::Money(self.money), position, velocity);
            self.money = 0.0;
        }
        if self.items.is_empty() {
            return;
        }
        for mut item in std::mem::take(&mut self.items).into_vec() {
            item.equipped = EquipState::None;
            let scatter = Vec2::from_angle(world.rng.gen_range(0.0..TAU)) * LOOT_SCATTER_SPEED;
            world.spawn_loot(LootContent::Item(item), position, velocity + scatter);
        }
    }

    pub fn drawables(&self, physics: &PhysicsWorld) -> Vec<Drawable> {
        let position = self.position(physics);
        let angle = self.angle(physics);
        let mut parts = vec![Drawable::Sprite {
            texture: self.hull.texture.clone(),
            position,
            size: self.hull.radius * 2.0,
            angle,
            tint: WHITE,
        }];
        if self.thrusting {
            parts.push(Drawable::Glow {
                position: position - Vec2::from_angle(angle) * self.hull.radius,
                radius: self.hull.radius * 0.3,
                color: Color::new(1.0, 0.6, 0.2, 0.8),
            });
        }
        if let Some(shield) = &self.shield {
            if shield.is_up() {
                let alpha = 0.15 + 0.25 * shield.life / shield.max_life.max(f32::EPSILON);
                parts.push(Drawable::Glow {
                    position,
                    radius: self.hull.shield_radius(),
                    color: Color::new(0.4, 0.7, 1.0, alpha),
                });
            }
        }
        parts
    }

    // =========================================================================
    // Far representation
    // =========================================================================

    pub fn to_far(&self, physics: &PhysicsWorld) -> FarShip {
        FarShip {
            hull: self.hull.clone(),
            faction: self.faction,
            pilot: self.pilot,
            position: self.position(physics),
            angle: self.angle(physics),
            health: self.health.current,
            money: self.money,
            items: self.items.clone().into_vec(),
        }
    }
}

/// A ship outside simulation range: no body, no update
#[derive(Debug, Clone)]
pub struct FarShip {
    pub hull: Arc<HullConfig>,
    pub faction: Faction,
    pub pilot: Pilot,
    pub position: Vec2,
    pub angle: f32,
    pub health: f32,
    pub money: f32,
    pub items: Vec<Item>,
}

impl FarShip {
    pub fn to_ship(&self, id: ObjectId, physics: &mut PhysicsWorld) -> Ship {
        Ship::build(
            id,
            ShipSpawn {
                hull: self.hull.clone(),
                faction: self.faction,
                pilot: self.pilot,
                position: self.position,
                angle: self.angle,
                velocity: Vec2::ZERO,
                money: self.money,
                items: self.items.clone(),
                health: Some(self.health),
            },
            physics,
        )
    }
}

impl std::fmt::Debug for Ship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ship")
            .field("hull", &self.hull.id)
            .field("faction", &self.faction)
            .field("pilot", &self.pilot)
            .field("health", &self.health.current)
            .field("money", &self.money)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Catalog;

    fn spawn(catalog: &Catalog, ship: &str) -> ShipSpawn {
        let config = catalog.ship(ship).unwrap();
        ShipSpawn {
            hull: catalog.hull(&config.hull).unwrap(),
            faction: Faction::Friendly,
            pilot: Pilot::Player,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            money: config.money,
            items: catalog.build_items(&config.items),
            health: None,
        }
    }

    #[test]
    fn test_build_equips_loadout() {
        let catalog = Catalog::builtin();
        let mut physics = PhysicsWorld::new();
        let ship = Ship::build(ObjectId::new(0, 0), spawn(&catalog, "starter"), &mut physics);

        assert!(ship.shield().is_some());
        assert_eq!(ship.items().guns_in(EquipState::Primary).len(), 1);
        assert_eq!(ship.items().guns_in(EquipState::Secondary).len(), 1);
        assert!(ship.ability.is_some());
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn test_damage_order_shield_armor_hull() {
        let catalog = Catalog::builtin();
        let mut physics = PhysicsWorld::new();
        let mut events = Events::new();
        let mut ship = Ship::build(ObjectId::new(0, 0), spawn(&catalog, "starter"), &mut physics);
        let shield_life = ship.shield().unwrap().life;
        let max = ship.health().max;

        ship.receive_damage(shield_life + 5.0, Vec2::ZERO, DamageType::Bullet, &mut events);
        assert!(!ship.shield().unwrap().is_up());
        assert_eq!(ship.health().current, max - 5.0);
        assert_eq!(events.sounds.len(), 1);
    }

    #[test]
    fn test_unequip_drops_shield() {
        let catalog = Catalog::builtin();
        let mut physics = PhysicsWorld::new();
        let mut ship = Ship::build(ObjectId::new(0, 0), spawn(&catalog, "starter"), &mut physics);

        let index = ship
            .items()
            .iter()
            .position(|i| matches!(i.kind, ItemKind::Shield(_)))
            .unwrap();
        assert!(ship.maybe_unequip(index));
        assert!(ship.shield().is_none());
        assert!(!ship.maybe_unequip(index));
    }

    #[test]
    fn test_far_round_trip_keeps_state() {
        let catalog = Catalog::builtin();
        let mut physics = PhysicsWorld::new();
        let mut ship = Ship::build(ObjectId::new(0, 0), spawn(&catalog, "starter"), &mut physics);
        let mut events = Events::new();
        ship.receive_damage(100.0, Vec2::ZERO, DamageType::Fire, &mut events);
        let health = ship.health().current;

        let far = ship.to_far(&physics);
        let back = far.to_ship(ObjectId::new(1, 0), &mut physics);
        assert_eq!(back.health().current, health);
        assert_eq!(back.items().len(), ship.items().len());
        assert_eq!(back.money(), ship.money());
    }

    #[test]
    fn test_steer_saturates() {
        assert_eq!(steer(0.0, 1.0, 1.0, 0.1), 1.0);
        assert_eq!(steer(0.0, -1.0, 1.0, 0.1), -1.0);
        assert!((steer(0.0, 0.05, 1.0, 0.1) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_emp_lock_keeps_longest() {
        let catalog = Catalog::builtin();
        let mut physics = PhysicsWorld::new();
        let mut ship = Ship::build(ObjectId::new(0, 0), spawn(&catalog, "pirate"), &mut physics);
        ship.disable_controls(2.0);
        ship.disable_controls(1.0);
        assert!(ship.controls_disabled());
        assert_eq!(ship.controls_disabled, 2.0);
    }

    #[test]
    fn test_wrecked_pirate_drops_money_and_items() {
        use crate::game::entity::IdAllocator;
        use crate::game::object::WorldObject;
        use crate::game::world::{ObjectStore, PendingChanges};
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let catalog = Catalog::builtin();
        let mut physics = PhysicsWorld::new();
        let mut ids = IdAllocator::new();
        let id = ids.allocate();
        let mut ship = Ship::build(
            id,
            ShipSpawn {
                pilot: Pilot::Ai { detection_range: 10.0 },
                ..spawn(&catalog, "pirate")
            },
            &mut physics,
        );
        let carried = ship.items().len();
        ship.receive_damage(10_000.0, Vec2::ZERO, DamageType::Bullet, &mut Events::new());

        let mut objects = ObjectStore::new();
        let mut pending = PendingChanges::default();
        let mut events = Events::new();
        let mut rng = StdRng::seed_from_u64(3);
        let input = PlayerInput::default();
        let mut world = World {
            self_id: id,
            time_step: 1.0 / 60.0,
            physics: &mut physics,
            objects: &mut objects,
            pending: &mut pending,
            ids: &mut ids,
            events: &mut events,
            rng: &mut rng,
            input: &input,
        };
        ship.on_remove(&mut world, RemovalReason::Destroyed);

        let drops: Vec<LootContent> = pending
            .take_additions()
            .into_iter()
            .filter_map(|(_, object)| match object {
                WorldObject::Loot(loot) => loot.content().cloned(),
                _ => None,
            })
            .collect();
        assert_eq!(drops.len(), carried + 1);
        assert!(drops.contains(&LootContent::Money(60.0)));
        let unequipped = drops.iter().all(|content| match content {
            LootContent::Item(item) => item.equipped == EquipState::None,
            LootContent::Money(_) => true,
        });
        assert!(unequipped);
        assert_eq!(ship.money(), 0.0);
        assert_eq!(physics.body_count(), drops.len());
    }
}

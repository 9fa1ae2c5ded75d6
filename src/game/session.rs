//! Game Session
//!
//! One play session: the generated galaxy, the object manager, the hero and
//! what the next hero inherits, the camera and map, and pause state. The
//! host calls `update` once per real frame and `on_game_end` when leaving.
//!
//! Frame order while running:
//! 1. Time factor from the speed multiplier and the hero's slow-motion
//! 2. Camera follows the hero; it is the streaming centre for this frame
//! 3. Planets advance along their orbits
//! 4. Object manager frame (physics, contacts, updates, sync point)
//! 5. The map animates
//!
//! While paused only the map animates.

use std::sync::Arc;

use macroquad::math::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::camera::{GameCamera, MapView};
use super::catalog::{Catalog, HullConfig, ShipConfig};
use super::config::{SimSettings, REAL_TIME_STEP, SUN_HOT_RADIUS, TUTORIAL_MONEY};
use super::drawable::Drawable;
use super::entity::ObjectId;
use super::event::Events;
use super::faction::Faction;
use super::hero::{Hero, RespawnState};
use super::item::{Item, ItemContainer};
use super::object::WorldObject;
use super::object_manager::{FrameInput, ObjectManager};
use super::planet::{self, PlanetManager};
use super::save::{SaveError, SaveManager, ShipRecord};
use super::ship::{Pilot, PlayerInput, Ship, ShipSpawn};
use super::world::{RemovalReason, Target};

/// How a session begins
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStart {
    /// Fresh galaxy flying the named ship configuration. No seed = random.
    NewGame { ship: String, seed: Option<u64> },
    /// Reload the saved world seed and hero ship
    Continue,
}

pub struct GameSession {
    catalog: Catalog,
    settings: SimSettings,
    saves: SaveManager,
    seed: u64,
    rng: StdRng,
    planets: PlanetManager,
    objects: ObjectManager,
    /// Base configuration every new hero starts from
    ship_config: ShipConfig,
    hero: Hero,
    respawn: RespawnState,
    camera: GameCamera,
    map: MapView,
    paused: bool,
    /// Game seconds elapsed
    time: f32,
    time_factor: f32,
    time_step: f32,
}

impl GameSession {
    /// Build the galaxy and spawn the first hero.
    ///
    /// # Panics
    ///
    /// Panics if neither the requested ship nor `settings.starting_ship`
    /// resolves to a hull in `catalog`.
    pub fn new(catalog: Catalog, settings: SimSettings, saves: SaveManager, start: SessionStart) -> Self {
        let (seed, ship_config) = match start {
            SessionStart::NewGame { ship, seed } => {
                let seed = seed.unwrap_or_else(rand::random);
                let config = resolve_ship(&catalog, &ship, &settings.starting_ship);
                (seed, config)
            }
            SessionStart::Continue => {
                let seed = match saves.load_world() {
                    Ok(seed) => seed,
                    Err(e) => {
                        log::warn!("no usable world save ({}), generating a new galaxy", e);
                        rand::random()
                    }
                };
                let config = match saves.load_ship() {
                    Ok(record) if catalog.hull(&record.hull).is_some() => ShipConfig {
                        hull: record.hull.clone(),
                        items: record.loadout(),
                        money: record.money,
                    },
                    Ok(record) => {
                        log::warn!("saved hull '{}' is unknown, using the default ship", record.hull);
                        resolve_ship(&catalog, &settings.starting_ship, &settings.starting_ship)
                    }
                    Err(e) => {
                        log::warn!("no usable ship save ({}), using the default ship", e);
                        resolve_ship(&catalog, &settings.starting_ship, &settings.starting_ship)
                    }
                };
                (seed, config)
            }
        };

        let galaxy = planet::generate(seed, &catalog);
        let mut objects = ObjectManager::new(settings.sim_radius, settings.far_radius);
        for far in galaxy.far {
            objects.add_far(far);
        }
        log::info!("session started with seed {}", seed);

        let mut session = Self {
            catalog,
            settings,
            saves,
            seed,
            rng: StdRng::seed_from_u64(seed ^ 0x5eed),
            planets: galaxy.planets,
            objects,
            ship_config,
            hero: Hero::Dead,
            respawn: RespawnState::default(),
            camera: GameCamera::default(),
            map: MapView::default(),
            paused: false,
            time: 0.0,
            time_factor: 1.0,
            time_step: REAL_TIME_STEP,
        };
        session.create_player();
        session
    }

    // =========================================================================
    // Hero lifecycle
    // =========================================================================

    /// Spawn a hero ship from the respawn state, falling back to the base
    /// configuration for anything not inherited.
    fn create_player(&mut self) {
        let money = if self.respawn.money != 0.0 {
            self.respawn.money
        } else if self.settings.tutorial {
            TUTORIAL_MONEY
        } else {
            self.ship_config.money
        };
        let hull = match self.respawn.hull.clone() {
            Some(hull) => hull,
            None => self.base_hull(),
        };
        let items: Vec<Item> = if self.respawn.has_items() {
            self.respawn.items.clone()
        } else {
            self.catalog.build_items(&self.ship_config.items)
        };

        let position = self.find_spawn_position();
        let spawn = ShipSpawn {
            hull,
            faction: Faction::Friendly,
            pilot: Pilot::Player,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            money,
            items,
            health: None,
        };
        let id = self
            .objects
            .spawn(|id, physics| WorldObject::Ship(Ship::build(id, spawn, physics)));
        self.hero = Hero::Alive(id);
        self.camera.snap_to(position);
        log::info!("hero spawned at ({:.1}, {:.1}) with {:.0} money", position.x, position.y, money);
    }

    fn base_hull(&self) -> Arc<HullConfig> {
        match self.catalog.hull(&self.ship_config.hull) {
            Some(hull) => hull,
            None => panic!("hero hull '{}' missing from the catalog", self.ship_config.hull),
        }
    }

    /// First empty spot on rings around the home star
    fn find_spawn_position(&self) -> Vec2 {
        let center = self.planets.systems().first().map_or(Vec2::ZERO, |s| s.position);
        for ring in 0..20 {
            let distance = SUN_HOT_RADIUS + 3.0 + ring as f32 * 2.0;
            for step in 0..12 {
                let angle = step as f32 * std::f32::consts::TAU / 12.0;
                let position = center + Vec2::from_angle(angle) * distance;
                if self.is_place_empty(position, true) {
                    return position;
                }
            }
        }
        log::warn!("no empty spawn point found, spawning next to the home star");
        center + Vec2::X * (SUN_HOT_RADIUS + 3.0)
    }

    /// Record the inheritance for the next hero and strip it from the
    /// current one. Does nothing once the hero is dead or transcendent.
    pub fn before_hero_death(&mut self) {
        let Hero::Alive(id) = self.hero else { return };
        if let Some(WorldObject::Ship(ship)) = self.objects.find_mut(id) {
            leave_inheritance(&mut self.respawn, ship, &mut self.rng);
        }
    }

    /// Replace the hero with a fresh ship. A live hero pays the death
    /// penalty and their ship is removed at the next sync point.
    pub fn respawn(&mut self) {
        match &self.hero {
            Hero::Alive(id) => {
                let id = *id;
                self.before_hero_death();
                self.objects.remove_deferred(id);
            }
            Hero::Transcendent(snapshot) => {
                let items = ItemContainer::from(snapshot.items.clone());
                let (money, hull) = (snapshot.money, snapshot.hull.clone());
                self.respawn.record(money, hull, &items, true, &mut self.rng);
            }
            Hero::Dead => {}
        }
        log::info!("hero respawning");
        self.create_player();
    }

    /// Lift the hero out of their ship. The ship leaves the world; the
    /// snapshot is what lands again.
    pub fn transcend(&mut self) {
        let Hero::Alive(id) = self.hero else { return };
        let Some(WorldObject::Ship(ship)) = self.objects.find(id) else {
            return;
        };
        let snapshot = ship.to_far(self.objects.physics());
        self.objects.remove_deferred(id);
        self.hero = Hero::Transcendent(snapshot);
        log::info!("hero transcended");
    }

    /// Put a transcendent hero back into a ship where the snapshot is
    pub fn land(&mut self) {
        let Hero::Transcendent(snapshot) = &self.hero else { return };
        let snapshot = snapshot.clone();
        let id = self
            .objects
            .spawn(|id, physics| WorldObject::Ship(snapshot.to_ship(id, physics)));
        self.hero = Hero::Alive(id);
        log::info!("hero landed");
    }

    // =========================================================================
    // Frame
    // =========================================================================

    pub fn update(&mut self, input: &PlayerInput) {
        if self.paused {
            self.map.update(REAL_TIME_STEP);
            return;
        }

        let slow_motion = self.hero_ship().map_or(1.0, |ship| ship.time_factor());
        self.time_factor = self.settings.game_speed_multiplier * slow_motion;
        self.time_step = REAL_TIME_STEP * self.time_factor;
        self.time += self.time_step;

        if let Some(target) = self.hero_position() {
            self.camera.follow(target, REAL_TIME_STEP);
        }
        self.planets.update(self.time_step);
        let removed = self.objects.update(FrameInput {
            time_step: self.time_step,
            camera: self.camera.position,
            player: input,
            planets: &self.planets,
            rng: &mut self.rng,
        });

        for mut gone in removed {
            if self.hero.ship_id() != Some(gone.id) || gone.reason != RemovalReason::Destroyed {
                continue;
            }
            if let WorldObject::Ship(ship) = &mut gone.object {
                leave_inheritance(&mut self.respawn, ship, &mut self.rng);
            }
            self.hero = Hero::Dead;
            log::info!("hero destroyed");
        }

        self.map.update(REAL_TIME_STEP);
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("game {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Persist the hero ship and world seed (not in the tutorial), then
    /// drop every object.
    pub fn on_game_end(&mut self) {
        if !self.settings.tutorial {
            match self.save_ship() {
                Ok(()) => log::info!("ship saved to {}", self.saves.base_dir().display()),
                Err(e) => log::error!("failed to save ship: {}", e),
            }
            match self.saves.save_world(self.seed) {
                Ok(()) => log::info!("world seed {} saved", self.seed),
                Err(e) => log::error!("failed to save world: {}", e),
            }
        }
        self.objects.dispose();
    }

    fn save_ship(&self) -> Result<(), SaveError> {
        let record = match &self.hero {
            Hero::Alive(id) => match self.objects.find(*id) {
                Some(WorldObject::Ship(ship)) => Some(ShipRecord::new(
                    &ship.hull().id,
                    ship.money(),
                    &ship.items().iter().cloned().collect::<Vec<_>>(),
                )),
                _ => None,
            },
            Hero::Transcendent(snapshot) => Some(ShipRecord::new(&snapshot.hull.id, snapshot.money, &snapshot.items)),
            Hero::Dead => self
                .respawn
                .hull
                .as_ref()
                .map(|hull| ShipRecord::new(&hull.id, self.respawn.money, &self.respawn.items)),
        };
        match record {
            Some(record) => self.saves.save_ship(&record),
            None => Err(SaveError::Malformed("no hero ship to save".to_string())),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_place_empty(&self, position: Vec2, consider_planets: bool) -> bool {
        self.objects.is_place_empty(position, consider_planets, &self.planets)
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    /// The hero's live ship, if they are flying one
    pub fn hero_ship(&self) -> Option<&Ship> {
        let id = self.hero.ship_id()?;
        self.objects.find(id)?.as_ship()
    }

    pub fn hero_id(&self) -> Option<ObjectId> {
        self.hero.ship_id()
    }

    /// Closest hostile to the hero, live or far
    pub fn nearest_threat(&self) -> Option<Target> {
        let position = self.hero_position()?;
        self.objects.nearest_enemy(Faction::Friendly, position, true)
    }

    pub fn hero_position(&self) -> Option<Vec2> {
        match &self.hero {
            Hero::Alive(id) => self.objects.position_of(*id),
            Hero::Transcendent(snapshot) => Some(snapshot.position),
            Hero::Dead => None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn objects(&self) -> &ObjectManager {
        &self.objects
    }

    pub fn planets(&self) -> &PlanetManager {
        &self.planets
    }

    pub fn camera(&self) -> &GameCamera {
        &self.camera
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapView {
        &mut self.map
    }

    pub fn time_factor(&self) -> f32 {
        self.time_factor
    }

    /// Effects and sounds produced since the last drain
    pub fn events_mut(&mut self) -> &mut Events {
        self.objects.events_mut()
    }

    pub fn drawables(&self) -> Vec<Drawable> {
        self.objects.drawables(self.time_step)
    }
}

/// Resolve a ship configuration by id, falling back to `fallback`.
///
/// # Panics
///
/// Panics if neither id names a ship whose hull exists.
fn resolve_ship(catalog: &Catalog, id: &str, fallback: &str) -> ShipConfig {
    for candidate in [id, fallback] {
        if let Some(config) = catalog.ship(candidate) {
            if catalog.hull(&config.hull).is_some() {
                return config.clone();
            }
        }
        log::warn!("ship '{}' cannot be built from the catalog", candidate);
    }
    panic!("no buildable hero ship ('{}' or '{}')", id, fallback);
}

/// Move money and retained items from `ship` into `respawn`. Retained items
/// leave the ship; everything left behind is unequipped.
fn leave_inheritance(respawn: &mut RespawnState, ship: &mut Ship, rng: &mut StdRng) {
    let kept = respawn.record(ship.money(), ship.hull().clone(), ship.items(), false, rng);
    ship.set_money(ship.money() - respawn.money);
    for index in kept.into_iter().rev() {
        ship.items_mut().remove(index);
    }
    for index in 0..ship.items().len() {
        ship.maybe_unequip(index);
    }
    log::debug!(
        "inheritance recorded: {:.0} money, {} items",
        respawn.money,
        respawn.items.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::item::EquipState;

    fn session_in(dir: &std::path::Path, settings: SimSettings, start: SessionStart) -> GameSession {
        GameSession::new(Catalog::builtin(), settings, SaveManager::with_base_dir(dir), start)
    }

    fn is_live(session: &GameSession, id: ObjectId) -> bool {
        session.objects.objects().any(|(live, _)| live == id)
    }

    fn new_game(seed: u64) -> SessionStart {
        SessionStart::NewGame {
            ship: "starter".to_string(),
            seed: Some(seed),
        }
    }

    #[test]
    fn test_new_game_spawns_hero_next_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(7));
        assert!(session.hero().is_alive());
        // Pending until the first sync point, but already resolvable
        assert!(session.hero_ship().is_some());

        session.update(&PlayerInput::default());
        let id = session.hero_id().unwrap();
        assert!(is_live(&session, id));
        assert_eq!(session.hero_ship().unwrap().money(), 1000.0);
    }

    #[test]
    fn test_hero_spawns_clear_of_stars() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path(), SimSettings::default(), new_game(3));
        let position = session.hero_position().unwrap();
        assert!(!session.planets().is_inside_sun(position));
        assert!(!session.planets().is_inside_planet(position));
    }

    #[test]
    fn test_paused_world_stands_still() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(11));
        let thrust = PlayerInput {
            thrust: true,
            ..PlayerInput::default()
        };
        for _ in 0..5 {
            session.update(&thrust);
        }

        session.set_paused(true);
        session.map_mut().zoom_in();
        let before = session.hero_position().unwrap();
        let time = session.time;
        let zoom = session.map().zoom;
        for _ in 0..30 {
            session.update(&thrust);
        }

        assert_eq!(session.hero_position().unwrap(), before);
        assert_eq!(session.time, time);
        assert!(session.map().zoom > zoom, "map keeps animating");

        session.set_paused(false);
        session.update(&thrust);
        assert_ne!(session.hero_position().unwrap(), before);
    }

    #[test]
    fn test_streaming_follows_this_frames_camera() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(17));
        session.update(&PlayerInput::default());
        let id = session.hero_id().unwrap();
        let hero = session.hero_position().unwrap();

        // Just past the far radius; one follow step brings it back inside
        session.camera.position = hero + Vec2::X * (session.settings.far_radius + 4.0);
        session.update(&PlayerInput::default());

        assert!(is_live(&session, id));
        assert_eq!(session.hero_id(), Some(id));
        assert!(session.camera.position.distance(hero) < session.settings.far_radius);
    }

    #[test]
    fn test_slow_motion_scales_time_step() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SimSettings {
            game_speed_multiplier: 2.0,
            ..SimSettings::default()
        };
        let mut session = session_in(dir.path(), settings, new_game(5));
        session.update(&PlayerInput::default());
        assert_eq!(session.time_factor(), 2.0);

        let ability = PlayerInput {
            ability: true,
            ..PlayerInput::default()
        };
        session.update(&ability);
        session.update(&PlayerInput::default());
        // Starter hull slows the world to 0.4
        assert!((session.time_factor() - 0.8).abs() < 1e-5);
        assert!((session.time_step - REAL_TIME_STEP * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_respawn_pays_penalty() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(9));
        session.update(&PlayerInput::default());
        let old = session.hero_id().unwrap();

        session.respawn();
        assert_eq!(session.respawn.money, 750.0);
        let new = session.hero_id().unwrap();
        assert_ne!(old, new);
        assert_eq!(session.hero_ship().unwrap().money(), 750.0);
        // Equipped gear always comes along, still equipped
        assert!(session.hero_ship().unwrap().shield().is_some());
        assert_eq!(session.hero_ship().unwrap().items().guns_in(EquipState::Primary).len(), 1);

        session.update(&PlayerInput::default());
        assert!(!is_live(&session, old));
        assert!(is_live(&session, new));
    }

    #[test]
    fn test_before_hero_death_strips_ship() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(9));
        session.update(&PlayerInput::default());

        session.before_hero_death();
        let ship = session.hero_ship().unwrap();
        assert_eq!(ship.money(), 250.0);
        assert!(ship.items().iter().all(|i| !i.equipped.is_equipped()));
        assert_eq!(ship.items().len() + session.respawn.items.len(), 4);
    }

    #[test]
    fn test_destroyed_hero_becomes_dead() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(13));
        session.update(&PlayerInput::default());
        let id = session.hero_id().unwrap();
        session.objects.find_mut(id).unwrap().receive_damage(
            10_000.0,
            Vec2::ZERO,
            crate::game::components::DamageType::Explosion,
            &mut Events::new(),
        );

        session.update(&PlayerInput::default());
        assert!(!session.hero().is_alive());
        assert!(session.respawn.player_respawned);
        assert_eq!(session.respawn.money, 750.0);

        session.respawn();
        assert!(session.hero().is_alive());
        assert_eq!(session.hero_ship().unwrap().money(), 750.0);
    }

    #[test]
    fn test_transcendent_respawn_keeps_all_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(21));
        session.update(&PlayerInput::default());
        let ship = session.hero_id().unwrap();

        session.transcend();
        assert!(session.hero().is_transcendent());
        session.update(&PlayerInput::default());
        assert!(!is_live(&session, ship));

        session.respawn();
        assert_eq!(session.respawn.items.len(), 4);
        assert_eq!(session.hero_ship().unwrap().items().len(), 4);
    }

    #[test]
    fn test_land_restores_ship() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(21));
        session.update(&PlayerInput::default());
        session.transcend();
        session.update(&PlayerInput::default());

        session.land();
        assert!(session.hero().is_alive() && !session.hero().is_transcendent());
        assert_eq!(session.hero_ship().unwrap().money(), 1000.0);
    }

    #[test]
    fn test_tutorial_money_and_no_saves() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SimSettings {
            tutorial: true,
            ..SimSettings::default()
        };
        let mut session = session_in(dir.path(), settings, new_game(1));
        assert_eq!(session.hero_ship().unwrap().money(), TUTORIAL_MONEY);

        session.on_game_end();
        let saves = SaveManager::with_base_dir(dir.path());
        assert!(saves.load_world().is_err());
        assert!(saves.load_ship().is_err());
    }

    #[test]
    fn test_continue_restores_seed_and_ship() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path(), SimSettings::default(), new_game(4242));
        session.update(&PlayerInput::default());
        session.respawn();
        session.update(&PlayerInput::default());
        session.on_game_end();
        assert_eq!(session.objects().live_count(), 0);

        let resumed = session_in(dir.path(), SimSettings::default(), SessionStart::Continue);
        assert_eq!(resumed.seed(), 4242);
        let ship = resumed.hero_ship().unwrap();
        assert_eq!(ship.hull().id, "scout");
        assert_eq!(ship.money(), 750.0);
    }

    #[test]
    fn test_continue_without_saves_uses_default_ship() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path(), SimSettings::default(), SessionStart::Continue);
        let ship = session.hero_ship().unwrap();
        assert_eq!(ship.hull().id, "scout");
        assert_eq!(ship.money(), 1000.0);
    }

    #[test]
    fn test_unknown_ship_falls_back() {
        let catalog = Catalog::builtin();
        let config = resolve_ship(&catalog, "no-such-ship", "starter");
        assert_eq!(config.hull, "scout");
    }
}

//! Planets and Star Systems
//!
//! Star systems sit at fixed positions; planets orbit their star and pull
//! nearby objects in. The galaxy generator lays out systems from a seed and
//! fills them with stations, asteroids and pirates, all starting in the far
//! set.

use std::f32::consts::TAU;

use macroquad::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::asteroid::HEALTH_PER_RADIUS;
use super::catalog::Catalog;
use super::config::SUN_HOT_RADIUS;
use super::faction::Faction;
use super::item::Item;
use super::object::FarObject;
use super::ship::{FarShip, Pilot};
use super::station::STATION_HEALTH;

#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    /// Solid ground radius
    pub radius: f32,
    /// Ground plus atmosphere; nothing spawns inside
    pub full_height: f32,
    /// Objects inside this range feel the pull
    pub gravity_radius: f32,
    /// Acceleration at ground level
    pub ground_gravity: f32,
    pub orbit_radius: f32,
    pub orbit_angle: f32,
    /// Radians per second
    pub orbit_speed: f32,
    position: Vec2,
}

impl Planet {
    pub fn new(star: Vec2, radius: f32, orbit_radius: f32, orbit_angle: f32, orbit_speed: f32) -> Self {
        let mut planet = Self {
            radius,
            full_height: radius * 1.5,
            gravity_radius: radius * 4.0,
            ground_gravity: 2.0,
            orbit_radius,
            orbit_angle,
            orbit_speed,
            position: Vec2::ZERO,
        };
        planet.place(star);
        planet
    }

    fn place(&mut self, star: Vec2) {
        self.position = star + Vec2::from_angle(self.orbit_angle) * self.orbit_radius;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    fn update(&mut self, star: Vec2, time_step: f32) {
        self.orbit_angle = (self.orbit_angle + self.orbit_speed * time_step) % TAU;
        self.place(star);
    }

    /// Pull toward the planet centre, inverse-square from the ground up
    pub fn gravity_at(&self, position: Vec2) -> Vec2 {
        let offset = self.position - position;
        let distance = offset.length();
        if distance >= self.gravity_radius || distance <= f32::EPSILON {
            return Vec2::ZERO;
        }
        let falloff = (self.radius / distance.max(self.radius)).powi(2);
        offset / distance * self.ground_gravity * falloff
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarSystem {
    pub name: String,
    pub position: Vec2,
    pub planets: Vec<Planet>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanetManager {
    systems: Vec<StarSystem>,
}

impl PlanetManager {
    pub fn new(systems: Vec<StarSystem>) -> Self {
        Self { systems }
    }

    pub fn systems(&self) -> &[StarSystem] {
        &self.systems
    }

    /// Move planets along their orbits
    pub fn update(&mut self, time_step: f32) {
        for system in &mut self.systems {
            let star = system.position;
            for planet in &mut system.planets {
                planet.update(star, time_step);
            }
        }
    }

    pub fn nearest_system(&self, position: Vec2) -> Option<&StarSystem> {
        self.systems
            .iter()
            .min_by(|a, b| a.position.distance(position).total_cmp(&b.position.distance(position)))
    }

    pub fn nearest_planet(&self, position: Vec2) -> Option<&Planet> {
        self.systems
            .iter()
            .flat_map(|s| s.planets.iter())
            .min_by(|a, b| a.position.distance(position).total_cmp(&b.position.distance(position)))
    }

    /// Inside a planet's ground or atmosphere
    pub fn is_inside_planet(&self, position: Vec2) -> bool {
        self.nearest_planet(position)
            .map_or(false, |p| p.position.distance(position) < p.full_height)
    }

    /// Too close to a star
    pub fn is_inside_sun(&self, position: Vec2) -> bool {
        self.nearest_system(position)
            .map_or(false, |s| s.position.distance(position) < SUN_HOT_RADIUS)
    }

    /// Summed pull of every planet in range
    pub fn gravity_at(&self, position: Vec2) -> Vec2 {
        self.systems
            .iter()
            .flat_map(|s| s.planets.iter())
            .map(|p| p.gravity_at(position))
            .sum()
    }
}

// =============================================================================
// Galaxy generation
// =============================================================================

/// Generated content: the planets, plus everything else as far objects
#[derive(Debug)]
pub struct Galaxy {
    pub planets: PlanetManager,
    pub far: Vec<FarObject>,
}

const SYSTEM_COUNT: usize = 3;
const SYSTEM_SPACING: f32 = 160.0;
const SYSTEM_NAMES: [&str; 6] = ["Aster", "Beryl", "Corvid", "Dorado", "Eridan", "Fornax"];

/// Build the galaxy for `seed`. The same seed always yields the same layout.
pub fn generate(seed: u64, catalog: &Catalog) -> Galaxy {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut systems = Vec::with_capacity(SYSTEM_COUNT);
    let mut far = Vec::new();

    for i in 0..SYSTEM_COUNT {
        let center = Vec2::new(i as f32 * SYSTEM_SPACING, rng.gen_range(-40.0..40.0));
        let name = SYSTEM_NAMES[rng.gen_range(0..SYSTEM_NAMES.len())].to_string();

        let planet_count = rng.gen_range(2..=4);
        let planets: Vec<Planet> = (0..planet_count)
            .map(|p| {
                let orbit = SUN_HOT_RADIUS + 12.0 + p as f32 * 14.0;
                Planet::new(
                    center,
                    rng.gen_range(2.0..4.0),
                    orbit,
                    rng.gen_range(0.0..TAU),
                    rng.gen_range(0.005..0.02),
                )
            })
            .collect();

        // A station parked between the sun and the first orbit
        let station_angle = rng.gen_range(0.0..TAU);
        far.push(FarObject::Station {
            faction: if i == 0 { Faction::Friendly } else { Faction::Hostile },
            position: center + Vec2::from_angle(station_angle) * (SUN_HOT_RADIUS + 5.0),
            angle: station_angle,
            health: STATION_HEALTH,
        });

        // An asteroid belt outside the planets
        let belt = SUN_HOT_RADIUS + 12.0 + planet_count as f32 * 14.0 + 6.0;
        for _ in 0..rng.gen_range(8..16) {
            let angle = rng.gen_range(0.0..TAU);
            let radius = rng.gen_range(0.3..1.2);
            far.push(FarObject::Asteroid {
                position: center + Vec2::from_angle(angle) * (belt + rng.gen_range(-3.0..3.0)),
                velocity: Vec2::from_angle(angle + TAU / 4.0) * rng.gen_range(0.05..0.3),
                radius,
                health: radius * HEALTH_PER_RADIUS,
            });
        }

        // Pirates stay away from the home system
        if i > 0 {
            for _ in 0..rng.gen_range(2..5) {
                let ship = if rng.gen_bool(0.25) { "pirate-heavy" } else { "pirate" };
                let angle = rng.gen_range(0.0..TAU);
                let position = center + Vec2::from_angle(angle) * rng.gen_range(belt * 0.5..belt);
                if let Some(pirate) = far_ship(catalog, ship, position, angle) {
                    far.push(FarObject::Ship(pirate));
                }
            }
        }

        systems.push(StarSystem {
            name,
            position: center,
            planets,
        });
    }

    Galaxy {
        planets: PlanetManager::new(systems),
        far,
    }
}

fn far_ship(catalog: &Catalog, id: &str, position: Vec2, angle: f32) -> Option<FarShip> {
    let config = catalog.ship(id)?;
    let hull = catalog.hull(&config.hull)?;
    let items: Vec<Item> = catalog.build_items(&config.items);
    Some(FarShip {
        health: hull.max_health,
        hull,
        faction: Faction::Hostile,
        pilot: Pilot::Ai { detection_range: 12.0 },
        position,
        angle,
        money: config.money,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_galaxy() {
        let catalog = Catalog::builtin();
        let a = generate(42, &catalog);
        let b = generate(42, &catalog);
        assert_eq!(a.planets.systems(), b.planets.systems());
        let pa: Vec<Vec2> = a.far.iter().map(|f| f.position()).collect();
        let pb: Vec<Vec2> = b.far.iter().map(|f| f.position()).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_different_seeds_differ() {
        let catalog = Catalog::builtin();
        let a = generate(1, &catalog);
        let b = generate(2, &catalog);
        assert_ne!(a.planets.systems(), b.planets.systems());
    }

    #[test]
    fn test_home_system_has_no_pirates() {
        let catalog = Catalog::builtin();
        let galaxy = generate(7, &catalog);
        let home = galaxy.planets.systems()[0].position;
        let pirates_near_home = galaxy
            .far
            .iter()
            .filter(|f| matches!(f, FarObject::Ship(_)))
            .filter(|f| f.position().distance(home) < 40.0)
            .count();
        assert_eq!(pirates_near_home, 0);
        assert!(galaxy.far.iter().any(|f| matches!(f, FarObject::Ship(_))));
    }

    #[test]
    fn test_gravity_points_inward_and_ends_at_range() {
        let planet = Planet::new(Vec2::ZERO, 2.0, 0.0, 0.0, 0.0);
        let pull = planet.gravity_at(Vec2::new(4.0, 0.0));
        assert!(pull.x < 0.0);
        assert_eq!(planet.gravity_at(Vec2::new(planet.gravity_radius + 0.1, 0.0)), Vec2::ZERO);
        // Ground level gets the full pull
        assert!((planet.gravity_at(Vec2::new(2.0, 0.0)).length() - planet.ground_gravity).abs() < 1e-5);
    }

    #[test]
    fn test_sun_and_planet_exclusion() {
        let star = Vec2::new(100.0, 0.0);
        let planets = PlanetManager::new(vec![StarSystem {
            name: "Test".to_string(),
            position: star,
            planets: vec![Planet::new(star, 3.0, 40.0, 0.0, 0.0)],
        }]);
        assert!(planets.is_inside_sun(star + Vec2::new(SUN_HOT_RADIUS - 1.0, 0.0)));
        assert!(!planets.is_inside_sun(star + Vec2::new(SUN_HOT_RADIUS + 1.0, 0.0)));
        assert!(planets.is_inside_planet(star + Vec2::new(40.0, 1.0)));
        assert!(!planets.is_inside_planet(star + Vec2::new(30.0, 0.0)));
    }

    #[test]
    fn test_orbits_advance() {
        let mut planets = PlanetManager::new(vec![StarSystem {
            name: "Test".to_string(),
            position: Vec2::ZERO,
            planets: vec![Planet::new(Vec2::ZERO, 3.0, 40.0, 0.0, 0.5)],
        }]);
        let before = planets.systems()[0].planets[0].position();
        planets.update(1.0);
        let after = planets.systems()[0].planets[0].position();
        assert!(before.distance(after) > 1.0);
        assert!((after.length() - 40.0).abs() < 1e-3);
    }
}

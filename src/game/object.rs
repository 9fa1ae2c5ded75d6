//! World Objects
//!
//! The closed set of things that live in the simulation. `WorldObject`
//! dispatches the shared capability contract (body, update, damage,
//! removal, drawing) to each variant. Optional capabilities such as shields
//! or guidance are plain data on the variant, not extra layers.
//!
//! `FarObject` is the lightweight stand-in kept for content outside the
//! simulation radius. It has no physics body and never updates.

use macroquad::math::Vec2;

use super::asteroid::Asteroid;
use super::components::DamageType;
use super::drawable::Drawable;
use super::entity::ObjectId;
use super::event::Events;
use super::faction::Faction;
use super::loot::{Loot, LootContent};
use super::physics::{BodyPart, PhysicsWorld};
use super::projectile::Projectile;
use super::ship::{FarShip, Ship};
use super::station::{Station, STATION_RADIUS};
use super::world::{RemovalReason, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Ship,
    Projectile,
    Asteroid,
    Loot,
    Station,
}

/// Snapshot of an object for contact decisions, so two objects can be
/// compared without borrowing both at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactProfile {
    pub kind: ObjectKind,
    pub faction: Option<Faction>,
    pub position: Vec2,
    /// Hull radius
    pub radius: f32,
    /// False for bodies that other projectiles cannot sweep into
    pub has_shape: bool,
    pub shield_radius: Option<f32>,
    pub shield_up: bool,
}

#[derive(Debug)]
pub enum WorldObject {
    Ship(Ship),
    Projectile(Projectile),
    Asteroid(Asteroid),
    Loot(Loot),
    Station(Station),
}

impl WorldObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            WorldObject::Ship(_) => ObjectKind::Ship,
            WorldObject::Projectile(_) => ObjectKind::Projectile,
            WorldObject::Asteroid(_) => ObjectKind::Asteroid,
            WorldObject::Loot(_) => ObjectKind::Loot,
            WorldObject::Station(_) => ObjectKind::Station,
        }
    }

    /// Point projectiles are the only objects without a physics body
    pub fn has_body(&self) -> bool {
        match self {
            WorldObject::Projectile(p) => !p.body().is_point(),
            _ => true,
        }
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        match self {
            WorldObject::Ship(s) => s.position(physics),
            WorldObject::Projectile(p) => p.position(physics),
            WorldObject::Asteroid(a) => a.position(physics),
            WorldObject::Loot(l) => l.position(physics),
            WorldObject::Station(s) => s.position(physics),
        }
    }

    pub fn faction(&self) -> Option<Faction> {
        match self {
            WorldObject::Ship(s) => Some(s.faction()),
            WorldObject::Projectile(p) => Some(p.faction()),
            WorldObject::Station(s) => Some(s.faction()),
            WorldObject::Asteroid(_) | WorldObject::Loot(_) => None,
        }
    }

    /// Whether pilots and guided projectiles may pick this as a target
    pub fn is_targetable(&self) -> bool {
        matches!(self, WorldObject::Ship(_) | WorldObject::Station(_))
    }

    pub fn update(&mut self, world: &mut World) {
        match self {
            WorldObject::Ship(s) => s.update(world),
            WorldObject::Projectile(p) => p.update(world),
            WorldObject::Loot(l) => l.update(world),
            WorldObject::Asteroid(_) | WorldObject::Station(_) => {}
        }
    }

    pub fn should_be_removed(&self) -> bool {
        match self {
            WorldObject::Ship(s) => s.should_be_removed(),
            WorldObject::Projectile(p) => p.should_be_removed(),
            WorldObject::Asteroid(a) => a.should_be_removed(),
            WorldObject::Loot(l) => l.should_be_removed(),
            WorldObject::Station(s) => s.should_be_removed(),
        }
    }

    /// Release the body and fire death effects. Runs once, right before
    /// the object leaves the live set.
    pub fn on_remove(&mut self, world: &mut World, reason: RemovalReason) {
        match self {
            WorldObject::Ship(s) => s.on_remove(world, reason),
            WorldObject::Projectile(p) => p.on_remove(world.physics),
            WorldObject::Asteroid(a) => a.on_remove(world, reason),
            WorldObject::Loot(l) => l.on_remove(world.physics),
            WorldObject::Station(s) => s.on_remove(world, reason),
        }
    }

    pub fn receive_damage(&mut self, amount: f32, position: Vec2, dmg_type: DamageType, events: &mut Events) {
        match self {
            WorldObject::Ship(s) => s.receive_damage(amount, position, dmg_type, events),
            WorldObject::Projectile(p) => p.receive_damage(position, events),
            WorldObject::Asteroid(a) => a.receive_damage(amount, dmg_type),
            WorldObject::Station(s) => s.receive_damage(amount, dmg_type),
            WorldObject::Loot(_) => {}
        }
    }

    pub fn receives_gravity(&self) -> bool {
        match self {
            WorldObject::Projectile(p) => p.receives_gravity(),
            WorldObject::Station(_) => false,
            _ => true,
        }
    }

    pub fn receive_force(&mut self, physics: &mut PhysicsWorld, force: Vec2, time_step: f32, is_acceleration: bool) {
        match self {
            WorldObject::Ship(s) => s.receive_force(physics, force, time_step, is_acceleration),
            WorldObject::Projectile(p) => p.receive_force(physics, force, time_step, is_acceleration),
            WorldObject::Asteroid(a) => a.receive_force(physics, force, time_step, is_acceleration),
            WorldObject::Loot(l) => l.receive_force(physics, force, time_step, is_acceleration),
            WorldObject::Station(_) => {}
        }
    }

    pub fn drawables(&self, physics: &PhysicsWorld, time_step: f32) -> Vec<Drawable> {
        match self {
            WorldObject::Ship(s) => s.drawables(physics),
            WorldObject::Projectile(p) => p.drawables(physics, time_step),
            WorldObject::Asteroid(a) => a.drawables(physics),
            WorldObject::Loot(l) => l.drawables(physics),
            WorldObject::Station(s) => s.drawables(physics),
        }
    }

    pub fn profile(&self, physics: &PhysicsWorld) -> ContactProfile {
        match self {
            WorldObject::Ship(s) => s.profile(physics),
            WorldObject::Projectile(p) => p.profile(physics),
            WorldObject::Asteroid(a) => a.profile(physics),
            WorldObject::Loot(l) => l.profile(physics),
            WorldObject::Station(s) => s.profile(physics),
        }
    }

    /// Only projectiles filter their contacts; everything else accepts them
    pub fn should_collide(&self, other: &ContactProfile, part: BodyPart) -> bool {
        match self {
            WorldObject::Projectile(p) => p.should_collide(other, part),
            _ => true,
        }
    }

    /// Stand-in for the far set. Projectiles never leave simulation range
    /// alive, and spent loot has nothing left to keep.
    pub fn to_far(&self, physics: &PhysicsWorld) -> Option<FarObject> {
        match self {
            WorldObject::Ship(s) => Some(FarObject::Ship(s.to_far(physics))),
            WorldObject::Projectile(_) => None,
            WorldObject::Asteroid(a) => Some(FarObject::Asteroid {
                position: a.position(physics),
                velocity: a.velocity(physics),
                radius: a.radius(),
                health: a.health().current,
            }),
            WorldObject::Loot(l) => l.content().map(|content| FarObject::Loot {
                content: content.clone(),
                position: l.position(physics),
                life: l.life(),
            }),
            WorldObject::Station(s) => Some(FarObject::Station {
                faction: s.faction(),
                position: s.position(physics),
                angle: s.angle(physics),
                health: s.health().current,
            }),
        }
    }

    pub fn as_ship(&self) -> Option<&Ship> {
        match self {
            WorldObject::Ship(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// Far objects
// =============================================================================

#[derive(Debug, Clone)]
pub enum FarObject {
    Ship(FarShip),
    Asteroid {
        position: Vec2,
        velocity: Vec2,
        radius: f32,
        health: f32,
    },
    Station {
        faction: Faction,
        position: Vec2,
        angle: f32,
        health: f32,
    },
    Loot {
        content: LootContent,
        position: Vec2,
        life: f32,
    },
}

impl FarObject {
    pub fn position(&self) -> Vec2 {
        match self {
            FarObject::Ship(s) => s.position,
            FarObject::Asteroid { position, .. }
            | FarObject::Station { position, .. }
            | FarObject::Loot { position, .. } => *position,
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            FarObject::Ship(s) => s.hull.radius,
            FarObject::Asteroid { radius, .. } => *radius,
            FarObject::Station { .. } => STATION_RADIUS,
            FarObject::Loot { .. } => 0.0,
        }
    }

    pub fn faction(&self) -> Option<Faction> {
        match self {
            FarObject::Ship(s) => Some(s.faction),
            FarObject::Station { faction, .. } => Some(*faction),
            FarObject::Asteroid { .. } | FarObject::Loot { .. } => None,
        }
    }

    pub fn is_targetable(&self) -> bool {
        matches!(self, FarObject::Ship(_) | FarObject::Station { .. })
    }

    /// Far objects drift on rails; only asteroids carry a velocity
    pub fn advance(&mut self, time_step: f32) {
        if let FarObject::Asteroid { position, velocity, .. } = self {
            *position += *velocity * time_step;
        }
    }

    /// Build the live object with a fresh body under `id`
    pub fn to_object(&self, id: ObjectId, physics: &mut PhysicsWorld) -> WorldObject {
        match self {
            FarObject::Ship(s) => WorldObject::Ship(s.to_ship(id, physics)),
            FarObject::Asteroid {
                position,
                velocity,
                radius,
                health,
            } => {
                let mut asteroid = Asteroid::new(id, *position, *velocity, *radius, physics);
                let lost = asteroid.health().max - *health;
                if lost > 0.0 {
                    asteroid.receive_damage(lost, DamageType::Crash);
                }
                WorldObject::Asteroid(asteroid)
            }
            FarObject::Station {
                faction,
                position,
                angle,
                health,
            } => WorldObject::Station(Station::new(id, *faction, *position, *angle, *health, physics)),
            FarObject::Loot { content, position, life } => {
                WorldObject::Loot(Loot::restore(id, content.clone(), *position, *life, physics))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::projectile::{ProjectileConfig, ProjectileSpawn};
    use crate::game::station::STATION_HEALTH;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn test_projectiles_never_go_far() {
        let mut physics = PhysicsWorld::new();
        let mut events = Events::new();
        let mut rng = StdRng::seed_from_u64(3);
        let spawn = ProjectileSpawn {
            angle: 0.0,
            muzzle_pos: Vec2::ZERO,
            gun_velocity: Vec2::ZERO,
            faction: Faction::Hostile,
            vary_speed: false,
        };
        let projectile = Projectile::new(
            ObjectId::new(0, 0),
            Arc::new(ProjectileConfig::default()),
            spawn,
            &mut physics,
            &mut events,
            &mut rng,
        );
        let object = WorldObject::Projectile(projectile);
        assert!(object.to_far(&physics).is_none());
        assert!(!object.has_body());
        assert!(!object.receives_gravity());
    }

    #[test]
    fn test_asteroid_far_round_trip() {
        let mut physics = PhysicsWorld::new();
        let mut asteroid = Asteroid::new(ObjectId::new(0, 0), Vec2::new(2.0, 1.0), Vec2::X, 0.5, &mut physics);
        asteroid.receive_damage(5.0, DamageType::Bullet);
        let object = WorldObject::Asteroid(asteroid);

        let far = object.to_far(&physics).unwrap();
        assert_eq!(far.position(), Vec2::new(2.0, 1.0));
        assert_eq!(far.radius(), 0.5);

        let WorldObject::Asteroid(back) = far.to_object(ObjectId::new(1, 0), &mut physics) else {
            panic!("expected an asteroid");
        };
        assert_eq!(back.health().current, back.health().max - 5.0);
    }

    #[test]
    fn test_only_ships_and_stations_are_targets() {
        let mut physics = PhysicsWorld::new();
        let station = Station::new(ObjectId::new(0, 0), Faction::Hostile, Vec2::ZERO, 0.0, STATION_HEALTH, &mut physics);
        let station = WorldObject::Station(station);
        let rock = WorldObject::Asteroid(Asteroid::new(ObjectId::new(1, 0), Vec2::ONE * 5.0, Vec2::ZERO, 0.3, &mut physics));
        assert!(station.is_targetable());
        assert!(!rock.is_targetable());
        assert_eq!(rock.faction(), None);
    }

    #[test]
    fn test_far_asteroids_drift() {
        let mut far = FarObject::Asteroid {
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, 0.0),
            radius: 0.5,
            health: 20.0,
        };
        far.advance(2.0);
        assert_eq!(far.position(), Vec2::new(2.0, 0.0));
    }
}

//! Stations
//!
//! Fixed installations. They belong to a faction, show up as targets for
//! hostile pilots and can be shot down.

use macroquad::color::WHITE;
use macroquad::math::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use super::components::{DamageType, Health};
use super::drawable::Drawable;
use super::entity::ObjectId;
use super::event::{EffectEvent, SoundEvent};
use super::faction::Faction;
use super::object::{ContactProfile, ObjectKind};
use super::physics::{BodyDesc, ColliderMode, ColliderTag, PhysicsWorld};
use super::world::{RemovalReason, World};

pub const STATION_RADIUS: f32 = 1.2;
pub const STATION_HEALTH: f32 = 400.0;

#[derive(Debug)]
pub struct Station {
    faction: Faction,
    body: RigidBodyHandle,
    health: Health,
}

impl Station {
    /// `health` is clamped to the station maximum
    pub fn new(
        id: ObjectId,
        faction: Faction,
        position: Vec2,
        angle: f32,
        health: f32,
        physics: &mut PhysicsWorld,
    ) -> Self {
        let body = physics.create_body(BodyDesc::fixed(position, angle));
        physics.add_ball_collider(body, STATION_RADIUS, 1.0, ColliderTag::hull(id), ColliderMode::Solid);
        let mut state = Health::new(STATION_HEALTH);
        state.current = health.clamp(0.0, STATION_HEALTH);
        Self {
            faction,
            body,
            health: state,
        }
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        physics.position(self.body)
    }

    pub fn angle(&self, physics: &PhysicsWorld) -> f32 {
        physics.angle(self.body)
    }

    pub fn should_be_removed(&self) -> bool {
        self.health.is_dead()
    }

    pub fn receive_damage(&mut self, amount: f32, dmg_type: DamageType) {
        // Hull plating shrugs off collisions
        if dmg_type != DamageType::Crash {
            self.health.damage(amount);
        }
    }

    pub fn profile(&self, physics: &PhysicsWorld) -> ContactProfile {
        ContactProfile {
            kind: ObjectKind::Station,
            faction: Some(self.faction),
            position: self.position(physics),
            radius: STATION_RADIUS,
            has_shape: true,
            shield_radius: None,
            shield_up: false,
        }
    }

    pub fn on_remove(&mut self, world: &mut World, reason: RemovalReason) {
        if reason != RemovalReason::ToFar && self.health.is_dead() {
            let position = self.position(world.physics);
            world.events.effects.send(EffectEvent::Explosion {
                position,
                size: STATION_RADIUS * 3.0,
            });
            world.events.sounds.send(SoundEvent {
                sound: "explosion".to_string(),
                position,
                source: None,
            });
        }
        world.physics.remove_body(self.body);
    }

    pub fn drawables(&self, physics: &PhysicsWorld) -> Vec<Drawable> {
        vec![Drawable::Sprite {
            texture: "station".to_string(),
            position: self.position(physics),
            size: STATION_RADIUS * 2.0,
            angle: self.angle(physics),
            tint: WHITE,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_crash_damage() {
        let mut physics = PhysicsWorld::new();
        let id = ObjectId::new(0, 0);
        let mut station = Station::new(id, Faction::Friendly, Vec2::ZERO, 0.0, STATION_HEALTH, &mut physics);
        station.receive_damage(1000.0, DamageType::Crash);
        assert!(!station.should_be_removed());
        station.receive_damage(1000.0, DamageType::Explosion);
        assert!(station.should_be_removed());
    }

    #[test]
    fn test_body_does_not_move() {
        let mut physics = PhysicsWorld::new();
        let position = Vec2::new(3.0, 4.0);
        let station = Station::new(ObjectId::new(0, 0), Faction::Hostile, position, 0.0, STATION_HEALTH, &mut physics);
        physics.step(1.0 / 60.0);
        assert_eq!(station.position(&physics), Vec2::new(3.0, 4.0));
    }
}

//! Asteroids
//!
//! Drifting rocks. Health scales with size, they take crash damage like
//! ships do, and break into a little money when destroyed.

use macroquad::color::WHITE;
use macroquad::math::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use super::components::{DamageType, Health};
use super::drawable::Drawable;
use super::entity::ObjectId;
use super::event::{EffectEvent, SoundEvent};
use super::loot::LootContent;
use super::object::{ContactProfile, ObjectKind};
use super::physics::{BodyDesc, ColliderMode, ColliderTag, PhysicsWorld};
use super::world::{RemovalReason, World};

pub const HEALTH_PER_RADIUS: f32 = 40.0;
const MONEY_PER_RADIUS: f32 = 12.0;
const DENSITY: f32 = 3.0;

#[derive(Debug)]
pub struct Asteroid {
    body: RigidBodyHandle,
    radius: f32,
    health: Health,
}

impl Asteroid {
    pub fn new(id: ObjectId, position: Vec2, velocity: Vec2, radius: f32, physics: &mut PhysicsWorld) -> Self {
        let body = physics.create_body(BodyDesc::dynamic(position, 0.0, velocity));
        physics.add_ball_collider(body, radius, DENSITY, ColliderTag::hull(id), ColliderMode::Solid);
        Self {
            body,
            radius,
            health: Health::new(radius * HEALTH_PER_RADIUS),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn health(&self) -> &Health {
        &self.health
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

    pub fn receive_damage(&mut self, amount: f32, _dmg_type: DamageType) {
        self.health.damage(amount);
    }

    pub fn receive_force(&mut self, physics: &mut PhysicsWorld, force: Vec2, time_step: f32, is_acceleration: bool) {
        if is_acceleration {
            physics.accelerate(self.body, force, time_step);
        } else {
            physics.apply_impulse(self.body, force * time_step);
        }
    }

    pub fn profile(&self, physics: &PhysicsWorld) -> ContactProfile {
        ContactProfile {
            kind: ObjectKind::Asteroid,
            faction: None,
            position: self.position(physics),
            radius: self.radius,
            has_shape: true,
            shield_radius: None,
            shield_up: false,
        }
    }

    pub fn on_remove(&mut self, world: &mut World, reason: RemovalReason) {
        if reason != RemovalReason::ToFar && self.health.is_dead() {
            let position = self.position(world.physics);
            let velocity = self.velocity(world.physics);
            world.events.effects.send(EffectEvent::Explosion {
                position,
                size: self.radius * 1.5,
            });
            world.events.sounds.send(SoundEvent {
                sound: "rock-break".to_string(),
                position,
                source: None,
            });
            world.spawn_loot(LootContent::Money(self.radius * MONEY_PER_RADIUS), position, velocity);
        }
        world.physics.remove_body(self.body);
    }

    pub fn drawables(&self, physics: &PhysicsWorld) -> Vec<Drawable> {
        vec![Drawable::Sprite {
            texture: "asteroid".to_string(),
            position: self.position(physics),
            size: self.radius * 2.0,
            angle: self.angle(physics),
            tint: WHITE,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_scales_with_size() {
        let mut physics = PhysicsWorld::new();
        let small = Asteroid::new(ObjectId::new(0, 0), Vec2::ZERO, Vec2::ZERO, 0.5, &mut physics);
        let big = Asteroid::new(ObjectId::new(1, 0), Vec2::new(5.0, 0.0), Vec2::ZERO, 1.0, &mut physics);
        assert_eq!(big.health().max, small.health().max * 2.0);
    }

    #[test]
    fn test_destroyed_after_enough_damage() {
        let mut physics = PhysicsWorld::new();
        let mut rock = Asteroid::new(ObjectId::new(0, 0), Vec2::ZERO, Vec2::ZERO, 0.5, &mut physics);
        rock.receive_damage(10.0, DamageType::Bullet);
        assert!(!rock.should_be_removed());
        rock.receive_damage(10.0, DamageType::Crash);
        assert!(rock.should_be_removed());
    }
}

//! Loot
//!
//! Money and items floating in space. A loot body carries a sensor collider;
//! when a ship touches it the contact dispatcher marks it picked, and on its
//! next update the loot hands its content over and disappears.

use macroquad::color::{Color, WHITE};
use macroquad::math::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use super::drawable::Drawable;
use super::entity::ObjectId;
use super::event::SoundEvent;
use super::item::Item;
use super::object::{ContactProfile, ObjectKind, WorldObject};
use super::physics::{BodyDesc, ColliderMode, ColliderTag, PhysicsWorld};
use super::world::World;

/// Seconds a loot drop drifts before it fades out
pub const LOOT_LIFETIME: f32 = 30.0;
const LOOT_RADIUS: f32 = 0.12;

#[derive(Debug, Clone, PartialEq)]
pub enum LootContent {
    Money(f32),
    Item(Item),
}

#[derive(Debug)]
pub struct Loot {
    content: Option<LootContent>,
    body: RigidBodyHandle,
    life: f32,
    /// Ship that touched this loot during the last physics step
    picked_by: Option<ObjectId>,
}

impl Loot {
    pub fn new(id: ObjectId, content: LootContent, position: Vec2, velocity: Vec2, physics: &mut PhysicsWorld) -> Self {
        let body = physics.create_body(BodyDesc::dynamic(position, 0.0, velocity));
        physics.add_ball_collider(body, LOOT_RADIUS, 0.2, ColliderTag::hull(id), ColliderMode::Sensor);
        Self {
            content: Some(content),
            body,
            life: LOOT_LIFETIME,
            picked_by: None,
        }
    }

    pub fn content(&self) -> Option<&LootContent> {
        self.content.as_ref()
    }

    /// Called by the contact dispatcher; the first ship wins
    pub fn pick(&mut self, ship: ObjectId) {
        if self.picked_by.is_none() {
            self.picked_by = Some(ship);
        }
    }

    #[cfg(test)]
    pub fn picked_by(&self) -> Option<ObjectId> {
        self.picked_by
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        physics.position(self.body)
    }

    pub fn should_be_removed(&self) -> bool {
        self.content.is_none() || self.life <= 0.0
    }

    pub fn update(&mut self, world: &mut World) {
        self.life -= world.time_step;

        let Some(ship_id) = self.picked_by.take() else { return };
        let Some(WorldObject::Ship(ship)) = world.objects.get_mut(ship_id) else {
            return;
        };
        if let Some(content) = self.content.take() {
            ship.collect(content);
            world.events.sounds.send(SoundEvent {
                sound: "loot-pickup".to_string(),
                position: self.position(world.physics),
                source: None,
            });
            let id = world.self_id;
            world.remove_deferred(id);
        }
    }

    pub fn profile(&self, physics: &PhysicsWorld) -> ContactProfile {
        ContactProfile {
            kind: ObjectKind::Loot,
            faction: None,
            position: self.position(physics),
            radius: LOOT_RADIUS,
            has_shape: false,
            shield_radius: None,
            shield_up: false,
        }
    }

    pub fn receive_force(&mut self, physics: &mut PhysicsWorld, force: Vec2, time_step: f32, is_acceleration: bool) {
        if is_acceleration {
            physics.accelerate(self.body, force, time_step);
        } else {
            physics.apply_impulse(self.body, force * time_step);
        }
    }

    pub fn on_remove(&mut self, physics: &mut PhysicsWorld) {
        physics.remove_body(self.body);
    }

    pub fn drawables(&self, physics: &PhysicsWorld) -> Vec<Drawable> {
        let texture = match &self.content {
            Some(LootContent::Money(_)) => "loot-money".to_string(),
            Some(LootContent::Item(item)) => format!("loot-{}", item.id),
            None => return Vec::new(),
        };
        // Fade out over the last few seconds
        let alpha = (self.life / 3.0).clamp(0.0, 1.0);
        vec![Drawable::Sprite {
            texture,
            position: self.position(physics),
            size: LOOT_RADIUS * 2.0,
            angle: 0.0,
            tint: Color { a: alpha, ..WHITE },
        }]
    }

    /// Rebuild from the far set with a fresh body
    pub fn restore(id: ObjectId, content: LootContent, position: Vec2, life: f32, physics: &mut PhysicsWorld) -> Self {
        let mut loot = Self::new(id, content, position, Vec2::ZERO, physics);
        loot.life = life;
        loot
    }

    pub fn life(&self) -> f32 {
        self.life
    }
}

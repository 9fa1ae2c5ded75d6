//! Projectiles
//!
//! Bullets, bolts and missiles. A projectile flies until something registers
//! as its obstacle, then on its next update it deals damage, spawns its
//! impact effects once and marks itself for removal.
//!
//! The obstacle slot is a one-shot inbox: contact handling writes it, `update`
//! takes it. Nothing else reads it.

mod body;
mod config;

pub use body::{angle_of, normalize_angle, segment_hits_circle, ProjectileBody};
pub use config::{EffectConfig, ProjectileConfig};

use std::sync::Arc;

use macroquad::color::{LIGHTGRAY, WHITE};
use macroquad::math::Vec2;
use rand::Rng;

use super::config::MIN_ANGLE_TO_GUIDE;
use super::drawable::{beam_length, Drawable, LightSource};
use super::entity::ObjectId;
use super::event::{EffectEvent, Events, SoundEvent};
use super::faction::{are_enemies, Faction};
use super::object::{ContactProfile, ObjectKind, WorldObject};
use super::particles::ParticleEmitter;
use super::physics::{BodyPart, PhysicsWorld};
use super::world::World;

/// Where and how a projectile leaves the gun
#[derive(Debug, Clone, Copy)]
pub struct ProjectileSpawn {
    pub angle: f32,
    pub muzzle_pos: Vec2,
    /// Velocity of the firing ship, added to the muzzle speed
    pub gun_velocity: Vec2,
    pub faction: Faction,
    /// Randomize muzzle speed by ±10%
    pub vary_speed: bool,
}

/// Per-frame heading correction toward `desired`, or `None` when the error is
/// below the guidance threshold. Never turns more than `turn_rate × time_step`.
pub fn guidance_turn(current: f32, desired: f32, turn_rate: f32, time_step: f32) -> Option<f32> {
    let diff = normalize_angle(desired - current);
    if diff.abs() < MIN_ANGLE_TO_GUIDE {
        return None;
    }
    let max_turn = (turn_rate * time_step).abs();
    Some(diff.clamp(-max_turn, max_turn))
}

pub struct Projectile {
    config: Arc<ProjectileConfig>,
    body: ProjectileBody,
    faction: Faction,
    body_effect: Option<ParticleEmitter>,
    trail_effect: Option<ParticleEmitter>,
    light: Option<LightSource>,
    obstacle: Option<ObjectId>,
    should_remove: bool,
}

impl Projectile {
    pub fn new(
        id: ObjectId,
        config: Arc<ProjectileConfig>,
        spawn: ProjectileSpawn,
        physics: &mut PhysicsWorld,
        events: &mut Events,
        rng: &mut impl Rng,
    ) -> Self {
        let mut speed = config.speed;
        if spawn.vary_speed {
            speed *= rng.gen_range(0.9..1.1);
        }
        let body = ProjectileBody::new(
            physics,
            id,
            spawn.muzzle_pos,
            spawn.angle,
            spawn.gun_velocity,
            speed,
            &config,
        );
        let velocity = body.velocity(physics);

        let body_effect = build_effect(config.body_effect.as_ref(), spawn.muzzle_pos, velocity, events);
        let trail_effect = build_effect(config.trail_effect.as_ref(), spawn.muzzle_pos, Vec2::ZERO, events);
        let light = (config.light_size > 0.0).then(|| {
            LightSource::new(config.light_size, config.light_color(), 0.1)
        });

        Self {
            config,
            body,
            faction: spawn.faction,
            body_effect,
            trail_effect,
            light,
            obstacle: None,
            should_remove: false,
        }
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn body(&self) -> &ProjectileBody {
        &self.body
    }

    pub fn should_be_removed(&self) -> bool {
        self.should_remove
    }

    /// Obstacle waiting to be resolved on the next update
    #[cfg(test)]
    pub fn pending_obstacle(&self) -> Option<ObjectId> {
        self.obstacle
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        self.body.position(physics)
    }

    // =========================================================================
    // Update
    // =========================================================================

    pub fn update(&mut self, world: &mut World) {
        let time_step = world.time_step;
        if let Some((from, to)) = self.body.update(world.physics, time_step) {
            if self.obstacle.is_none() {
                self.sweep(world, from, to);
            }
        }

        if let Some(obstacle) = self.obstacle.take() {
            let position = self.body.position(world.physics);
            self.collided(position, Some(world.self_id), world.events);
            if let Some(target) = world.objects.get_mut(obstacle) {
                target.receive_damage(self.config.damage, position, self.config.damage_type, world.events);
                if self.config.em_time > 0.0 {
                    if let WorldObject::Ship(ship) = target {
                        ship.disable_controls(self.config.em_time);
                    }
                }
            }
            return;
        }

        let position = self.body.position(world.physics);
        let velocity = self.body.velocity(world.physics);
        self.tick_effects(position, velocity, time_step, world.events);
        if let Some(light) = &mut self.light {
            light.update(true, position, time_step);
        }
        self.maybe_guide(world);
        if let Some(sound) = &self.config.work_sound {
            world.events.sounds.send(SoundEvent {
                sound: sound.clone(),
                position,
                source: Some(world.self_id),
            });
        }
    }

    /// Point bodies find their own obstacles along the segment they travelled
    fn sweep(&mut self, world: &World, from: Vec2, to: Vec2) {
        let own = self.profile(world.physics);
        let mut best: Option<(f32, ObjectId, ContactProfile)> = None;

        for (id, other) in world.objects.iter() {
            let profile = other.profile(world.physics);
            if !profile.has_shape {
                continue;
            }
            let parts = [
                (BodyPart::Shield, profile.shield_radius),
                (BodyPart::Hull, Some(profile.radius)),
            ];
            for (part, radius) in parts {
                let Some(radius) = radius else { continue };
                let Some(t) = segment_hits_circle(from, to, profile.position, radius) else {
                    continue;
                };
                if !self.should_collide(&profile, part) || !other.should_collide(&own, BodyPart::Hull) {
                    continue;
                }
                if best.as_ref().map_or(true, |(best_t, _, _)| t < *best_t) {
                    best = Some((t, id, profile));
                }
                break;
            }
        }

        if let Some((_, id, profile)) = best {
            self.set_obstacle(id, &profile);
        }
    }

    fn maybe_guide(&mut self, world: &mut World) {
        if !self.config.is_guided() {
            return;
        }
        let position = self.body.position(world.physics);
        let Some(target) = world.nearest_enemy(self.faction, position) else {
            return;
        };
        let desired = self.body.desired_angle(world.physics, target.position);
        let current = self.body.angle(world.physics);
        if let Some(turn) = guidance_turn(current, desired, self.config.guide_rot_speed, world.time_step) {
            self.body.change_angle(world.physics, turn);
        }
    }

    fn tick_effects(&mut self, position: Vec2, velocity: Vec2, time_step: f32, events: &mut Events) {
        for (emitter, inherit) in [(&mut self.body_effect, velocity), (&mut self.trail_effect, Vec2::ZERO)] {
            let Some(emitter) = emitter else { continue };
            let count = emitter.tick(time_step);
            if count > 0 {
                events.effects.send(EffectEvent::Burst {
                    emitter: emitter.def.clone(),
                    position,
                    velocity: inherit,
                    count,
                });
            }
        }
    }

    /// Impact: spawn effects and sound once, then wait for removal
    fn collided(&mut self, position: Vec2, source: Option<ObjectId>, events: &mut Events) {
        self.should_remove = true;
        build_effect(self.config.collision_effect.as_ref(), position, Vec2::ZERO, events);
        build_effect(self.config.collision_effect_bg.as_ref(), position, Vec2::ZERO, events);
        let size = self
            .config
            .collision_effect_bg
            .as_ref()
            .map_or(self.config.texture_size, |e| e.size);
        events.effects.send(EffectEvent::Impact {
            position,
            size,
            blinks: self.config.collision_effect_bg.is_some(),
        });
        if let Some(sound) = &self.config.collision_sound {
            events.sounds.send(SoundEvent {
                sound: sound.clone(),
                position,
                source,
            });
        }
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// Is a contact with `other` (at its `part`) meaningful for this projectile?
    pub fn should_collide(&self, other: &ContactProfile, part: BodyPart) -> bool {
        match other.kind {
            ObjectKind::Ship => {
                if !other.faction.map_or(false, |f| are_enemies(f, self.faction)) {
                    return false;
                }
                if part == BodyPart::Shield {
                    if self.config.is_dense() {
                        return false;
                    }
                    if !other.shield_up {
                        return false;
                    }
                }
                true
            }
            ObjectKind::Projectile => other.faction.map_or(false, |f| are_enemies(f, self.faction)),
            _ => true,
        }
    }

    /// Register what this projectile struck; resolved on the next update
    pub fn set_obstacle(&mut self, id: ObjectId, other: &ContactProfile) {
        if self.config.is_dense() && other.kind == ObjectKind::Projectile {
            return;
        }
        if other.kind == ObjectKind::Ship && !other.faction.map_or(false, |f| are_enemies(f, self.faction)) {
            log::debug!("ignoring obstacle against a non-hostile ship");
            return;
        }
        if self.obstacle.is_none() {
            self.obstacle = Some(id);
        }
    }

    pub fn profile(&self, physics: &PhysicsWorld) -> ContactProfile {
        ContactProfile {
            kind: ObjectKind::Projectile,
            faction: Some(self.faction),
            position: self.body.position(physics),
            radius: self.config.phys_size,
            has_shape: !self.body.is_point(),
            shield_radius: None,
            shield_up: false,
        }
    }

    // =========================================================================
    // Capability contract
    // =========================================================================

    /// Dense projectiles shrug off damage; massless ones are destroyed by it
    pub fn receive_damage(&mut self, position: Vec2, events: &mut Events) {
        if self.config.is_dense() {
            return;
        }
        if !self.should_remove {
            self.collided(position, None, events);
        }
    }

    pub fn receives_gravity(&self) -> bool {
        !self.config.massless
    }

    pub fn receive_force(&mut self, physics: &mut PhysicsWorld, force: Vec2, time_step: f32, is_acceleration: bool) {
        self.body.receive_force(physics, force, time_step, is_acceleration);
    }

    pub fn on_remove(&mut self, physics: &mut PhysicsWorld) {
        if let Some(effect) = &mut self.body_effect {
            effect.finish();
        }
        if let Some(effect) = &mut self.trail_effect {
            effect.finish();
        }
        self.body.on_remove(physics);
    }

    pub fn drawables(&self, physics: &PhysicsWorld, time_step: f32) -> Vec<Drawable> {
        let position = self.body.position(physics);
        let velocity = self.body.velocity(physics);
        let mut parts = Vec::with_capacity(2);

        if self.config.stretch {
            let width = self.config.texture_size;
            parts.push(Drawable::Beam {
                texture: self.config.texture.clone(),
                position,
                length: beam_length(velocity.length(), time_step, width),
                width,
                angle: angle_of(velocity),
                tint: LIGHTGRAY,
            });
        } else {
            parts.push(Drawable::Sprite {
                texture: self.config.texture.clone(),
                position,
                size: self.config.texture_size,
                angle: self.body.angle(physics),
                tint: WHITE,
            });
        }
        if let Some(light) = &self.light {
            parts.push(light.drawable());
        }
        parts
    }
}

/// Continuous effects attach and keep emitting; one-shot effects fire now.
fn build_effect(
    effect: Option<&EffectConfig>,
    position: Vec2,
    velocity: Vec2,
    events: &mut Events,
) -> Option<ParticleEmitter> {
    let effect = effect?;
    if effect.is_continuous() {
        Some(ParticleEmitter::new(effect.emitter.clone()))
    } else {
        events.effects.send(EffectEvent::Burst {
            emitter: effect.emitter.clone(),
            position,
            velocity,
            count: effect.burst_count(),
        });
        None
    }
}

impl std::fmt::Debug for Projectile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projectile")
            .field("config", &self.config.id)
            .field("faction", &self.faction)
            .field("obstacle", &self.obstacle)
            .field("should_remove", &self.should_remove)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::components::DamageType;
    use crate::game::particles::ParticleEmitterDef;
    use macroquad::color::Color;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn projectile(config: ProjectileConfig, faction: Faction) -> (Projectile, PhysicsWorld, Events) {
        let mut physics = PhysicsWorld::new();
        let mut events = Events::new();
        let mut rng = StdRng::seed_from_u64(1);
        let spawn = ProjectileSpawn {
            angle: 0.0,
            muzzle_pos: Vec2::ZERO,
            gun_velocity: Vec2::ZERO,
            faction,
            vary_speed: false,
        };
        let p = Projectile::new(ObjectId::new(0, 0), Arc::new(config), spawn, &mut physics, &mut events, &mut rng);
        (p, physics, events)
    }

    fn ship_profile(faction: Faction, shield_up: bool) -> ContactProfile {
        ContactProfile {
            kind: ObjectKind::Ship,
            faction: Some(faction),
            position: Vec2::new(5.0, 0.0),
            radius: 0.5,
            has_shape: true,
            shield_radius: Some(0.8),
            shield_up,
        }
    }

    #[test]
    fn test_guidance_converges_without_overshoot() {
        let rate = PI;
        let step = 1.0 / 60.0;
        let desired = 1.0;
        let mut heading = -2.0f32;
        let mut error = normalize_angle(desired - heading).abs();

        while let Some(turn) = guidance_turn(heading, desired, rate, step) {
            assert!(turn.abs() <= rate * step + 1e-6);
            heading += turn;
            let next = normalize_angle(desired - heading).abs();
            assert!(next < error, "error must shrink every frame");
            error = next;
        }
        assert!(error < MIN_ANGLE_TO_GUIDE);
    }

    #[test]
    fn test_guidance_takes_short_way_round() {
        let turn = guidance_turn(3.0, -3.0, 1.0, 0.1).unwrap();
        assert!(turn > 0.0, "crossing PI is shorter than going back through 0");
    }

    #[test]
    fn test_guidance_ignores_tiny_errors() {
        assert!(guidance_turn(0.0, MIN_ANGLE_TO_GUIDE * 0.5, 10.0, 1.0).is_none());
    }

    #[test]
    fn test_massless_shield_gating() {
        let (p, _, _) = projectile(ProjectileConfig::default(), Faction::Hostile);

        assert!(p.should_collide(&ship_profile(Faction::Friendly, true), BodyPart::Shield));
        assert!(!p.should_collide(&ship_profile(Faction::Friendly, false), BodyPart::Shield));
        // With the shield down the hull still counts
        assert!(p.should_collide(&ship_profile(Faction::Friendly, false), BodyPart::Hull));
    }

    #[test]
    fn test_dense_projectiles_pass_shields() {
        let config = ProjectileConfig {
            density: 2.0,
            ..ProjectileConfig::default()
        };
        let (p, _, _) = projectile(config, Faction::Hostile);
        assert!(!p.should_collide(&ship_profile(Faction::Friendly, true), BodyPart::Shield));
        assert!(p.should_collide(&ship_profile(Faction::Friendly, true), BodyPart::Hull));
    }

    #[test]
    fn test_friendly_fire_is_filtered() {
        let (mut p, _, _) = projectile(ProjectileConfig::default(), Faction::Friendly);
        let friend = ship_profile(Faction::Friendly, false);
        assert!(!p.should_collide(&friend, BodyPart::Hull));

        p.set_obstacle(ObjectId::new(3, 0), &friend);
        assert_eq!(p.pending_obstacle(), None);

        p.set_obstacle(ObjectId::new(4, 0), &ship_profile(Faction::Hostile, false));
        assert_eq!(p.pending_obstacle(), Some(ObjectId::new(4, 0)));
    }

    #[test]
    fn test_dense_projectile_ignores_projectile_obstacles() {
        let config = ProjectileConfig {
            density: 1.0,
            phys_size: 0.1,
            ..ProjectileConfig::default()
        };
        let (mut p, _, _) = projectile(config, Faction::Hostile);
        let bullet = ContactProfile {
            kind: ObjectKind::Projectile,
            faction: Some(Faction::Friendly),
            position: Vec2::ZERO,
            radius: 0.0,
            has_shape: false,
            shield_radius: None,
            shield_up: false,
        };
        p.set_obstacle(ObjectId::new(1, 0), &bullet);
        assert_eq!(p.pending_obstacle(), None);
    }

    #[test]
    fn test_receive_damage_by_density() {
        let (mut massless, _, mut events) = projectile(ProjectileConfig::default(), Faction::Hostile);
        massless.receive_damage(Vec2::ZERO, &mut events);
        assert!(massless.should_be_removed());
        assert_eq!(events.effects.len(), 1);

        let dense_config = ProjectileConfig {
            density: 1.0,
            ..ProjectileConfig::default()
        };
        let (mut dense, _, mut events) = projectile(dense_config, Faction::Hostile);
        dense.receive_damage(Vec2::ZERO, &mut events);
        assert!(!dense.should_be_removed());
        assert!(events.effects.is_empty());
    }

    #[test]
    fn test_effects_attach_or_fire_once() {
        let config = ProjectileConfig {
            body_effect: Some(EffectConfig::new(ParticleEmitterDef::plasma_glow(), 0.2, LIGHTGRAY)),
            trail_effect: Some(EffectConfig::new(ParticleEmitterDef::sparks(), 0.2, WHITE)),
            light_size: 0.3,
            ..ProjectileConfig::default()
        };
        let (p, physics, events) = projectile(config, Faction::Hostile);

        assert!(p.body_effect.is_some());
        assert!(p.trail_effect.is_none(), "one-shot effects do not attach");
        assert_eq!(events.effects.len(), 1);
        assert_eq!(p.light.as_ref().map(|l| l.color), Some(LIGHTGRAY));

        let parts = p.drawables(&physics, 1.0 / 60.0);
        assert!(matches!(parts[0], Drawable::Beam { .. }));
        assert!(matches!(parts[1], Drawable::Light { .. }));
    }

    #[test]
    fn test_light_takes_one_shot_body_effect_tint() {
        let tint = Color::new(1.0, 0.3, 0.2, 1.0);
        let config = ProjectileConfig {
            body_effect: Some(EffectConfig::new(ParticleEmitterDef::sparks(), 0.2, tint)),
            light_size: 0.3,
            ..ProjectileConfig::default()
        };
        let (p, _, events) = projectile(config, Faction::Hostile);

        assert!(p.body_effect.is_none());
        assert_eq!(events.effects.len(), 1);
        assert_eq!(p.light.as_ref().map(|l| l.color), Some(tint));
    }

    #[test]
    fn test_gravity_only_for_massive() {
        let (p, _, _) = projectile(ProjectileConfig::default(), Faction::Hostile);
        assert!(!p.receives_gravity());

        let config = ProjectileConfig {
            massless: false,
            ..ProjectileConfig::default()
        };
        let (p, _, _) = projectile(config, Faction::Hostile);
        assert!(p.receives_gravity());
    }

    #[test]
    fn test_damage_type_is_copied_from_config() {
        let config = ProjectileConfig {
            damage_type: DamageType::Energy,
            ..ProjectileConfig::default()
        };
        let (p, _, _) = projectile(config, Faction::Hostile);
        assert_eq!(p.config.damage_type, DamageType::Energy);
    }
}

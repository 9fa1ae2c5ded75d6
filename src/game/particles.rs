//! Particle System
//!
//! Effects use a fixed-size pool of short-lived particles. Objects describe
//! effects with `ParticleEmitterDef`; continuous emitters ride along with
//! their owner and are ticked every frame, one-shot emitters fire a single
//! burst and are done.

use macroquad::color::Color;
use macroquad::math::Vec2;
use macroquad::shapes::draw_rectangle;
use serde::{Deserialize, Serialize};

/// Maximum number of live particles
pub const MAX_PARTICLES: usize = 512;

/// A single particle in the pool
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec2,
    /// Units per second
    pub velocity: Vec2,
    /// Remaining life in seconds
    pub life: f32,
    /// Total lifetime (for interpolation)
    pub max_life: f32,
    /// Start color (RGB 0-255)
    pub color_start: [u8; 3],
    /// End color (RGB 0-255)
    pub color_end: [u8; 3],
    /// Edge length in world units
    pub size: f32,
    pub alive: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            life: 0.0,
            max_life: 1.0,
            color_start: [255, 255, 255],
            color_end: [128, 128, 128],
            size: 0.05,
            alive: false,
        }
    }
}

/// Definition for a particle emitter (design-time data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEmitterDef {
    /// Particles to emit per second; 0 = burst only
    pub spawn_rate: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Spread half-angle in radians around the base direction (PI = all around)
    pub spread: f32,
    /// Velocity damping per second (0 = none)
    pub drag: f32,
    pub life_min: f32,
    pub life_max: f32,
    pub color_start: [u8; 3],
    pub color_end: [u8; 3],
    pub size: f32,
}

impl Default for ParticleEmitterDef {
    fn default() -> Self {
        Self {
            spawn_rate: 0.0,
            speed_min: 1.0,
            speed_max: 3.0,
            spread: std::f32::consts::PI,
            drag: 0.0,
            life_min: 0.3,
            life_max: 0.8,
            color_start: [255, 200, 50],
            color_end: [200, 50, 0],
            size: 0.06,
        }
    }
}

/// Common particle effect presets
impl ParticleEmitterDef {
    /// Bright sparks for bullet impacts
    pub fn sparks() -> Self {
        Self {
            speed_min: 2.0,
            speed_max: 5.0,
            drag: 2.0,
            life_min: 0.1,
            life_max: 0.3,
            color_start: [255, 255, 200],
            color_end: [255, 150, 0],
            size: 0.04,
            ..Self::default()
        }
    }

    /// Slow grey smoke behind missiles
    pub fn smoke_trail() -> Self {
        Self {
            spawn_rate: 40.0,
            speed_min: 0.1,
            speed_max: 0.4,
            drag: 1.0,
            life_min: 0.4,
            life_max: 0.9,
            color_start: [180, 180, 180],
            color_end: [60, 60, 60],
            size: 0.08,
            ..Self::default()
        }
    }

    /// Glowing plasma surrounding energy bolts
    pub fn plasma_glow() -> Self {
        Self {
            spawn_rate: 60.0,
            speed_min: 0.0,
            speed_max: 0.3,
            life_min: 0.05,
            life_max: 0.15,
            color_start: [120, 220, 255],
            color_end: [20, 60, 200],
            size: 0.1,
            ..Self::default()
        }
    }

    /// Fireball for destroyed hulls and rocks
    pub fn fire() -> Self {
        Self {
            speed_min: 0.5,
            speed_max: 2.5,
            drag: 1.5,
            life_min: 0.5,
            life_max: 1.2,
            color_start: [255, 200, 50],
            color_end: [120, 20, 0],
            size: 0.15,
            ..Self::default()
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.spawn_rate > 0.0
    }
}

/// Runtime particle emitter attached to an object
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    pub def: ParticleEmitterDef,
    /// Accumulated fractional particles
    pub spawn_accumulator: f32,
    pub active: bool,
}

impl ParticleEmitter {
    pub fn new(def: ParticleEmitterDef) -> Self {
        Self {
            def,
            spawn_accumulator: 0.0,
            active: true,
        }
    }

    /// How many particles to emit this frame
    pub fn tick(&mut self, delta_time: f32) -> usize {
        if !self.active {
            return 0;
        }
        self.spawn_accumulator += self.def.spawn_rate * delta_time;
        let count = self.spawn_accumulator.floor();
        self.spawn_accumulator -= count;
        count as usize
    }

    /// Stop emitting; particles already out keep living
    pub fn finish(&mut self) {
        self.active = false;
    }
}

/// The particle pool — manages all live particles
pub struct ParticlePool {
    pub particles: Vec<Particle>,
    /// Simple PRNG state for randomization
    rng_state: u32,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self {
            particles: vec![Particle::default(); MAX_PARTICLES],
            rng_state: 12345,
        }
    }

    /// Fast xorshift PRNG, purely cosmetic so it stays out of the seeded game RNG
    fn next_random(&mut self) -> f32 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;
        (self.rng_state as f32) / (u32::MAX as f32)
    }

    fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_random() * (max - min)
    }

    fn find_free_slot(&self) -> Option<usize> {
        self.particles.iter().position(|p| !p.alive)
    }

    /// Spawn one particle moving away from `origin`, inheriting `base_velocity`
    pub fn spawn_one(&mut self, def: &ParticleEmitterDef, origin: Vec2, base_velocity: Vec2) {
        let Some(idx) = self.find_free_slot() else {
            return;
        };
        let speed = self.random_range(def.speed_min, def.speed_max);
        let life = self.random_range(def.life_min, def.life_max);

        let heading = if base_velocity.length_squared() > 0.0 {
            base_velocity.y.atan2(base_velocity.x) + std::f32::consts::PI
        } else {
            0.0
        };
        let angle = heading + self.random_range(-def.spread, def.spread);
        let velocity = base_velocity + Vec2::from_angle(angle) * speed;

        self.particles[idx] = Particle {
            position: origin,
            velocity,
            life,
            max_life: life,
            color_start: def.color_start,
            color_end: def.color_end,
            size: def.size,
            alive: true,
        };
    }

    /// Spawn a burst of particles (for one-shot effects like hits)
    pub fn spawn_burst(&mut self, def: &ParticleEmitterDef, origin: Vec2, base_velocity: Vec2, count: usize) {
        for _ in 0..count {
            self.spawn_one(def, origin, base_velocity);
        }
    }

    pub fn update(&mut self, delta_time: f32) {
        for particle in &mut self.particles {
            if !particle.alive {
                continue;
            }

            particle.life -= delta_time;
            if particle.life <= 0.0 {
                particle.alive = false;
                continue;
            }

            particle.position += particle.velocity * delta_time;
        }
    }

    /// Draw all live particles. Expects a world-space camera to be set.
    pub fn render(&self) {
        for particle in self.particles.iter().filter(|p| p.alive) {
            // 0 = just spawned, 1 = about to die
            let t = 1.0 - (particle.life / particle.max_life);
            let color = Color::from_rgba(
                lerp_u8(particle.color_start[0], particle.color_end[0], t),
                lerp_u8(particle.color_start[1], particle.color_end[1], t),
                lerp_u8(particle.color_start[2], particle.color_end[2], t),
                lerp_u8(255, 0, t),
            );
            let half = particle.size * 0.5;
            draw_rectangle(
                particle.position.x - half,
                particle.position.y - half,
                particle.size,
                particle.size,
                color,
            );
        }
    }

    pub fn alive_count(&self) -> usize {
        self.particles.iter().filter(|p| p.alive).count()
    }
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new()
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let result = a as f32 * (1.0 - t) + b as f32 * t;
    result.clamp(0.0, 255.0) as u8
}

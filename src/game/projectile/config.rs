//! Projectile templates
//!
//! A `ProjectileConfig` is built once by the catalog and shared read-only by
//! every projectile fired from it.

use macroquad::color::{Color, WHITE};

use crate::game::components::DamageType;
use crate::game::particles::ParticleEmitterDef;

/// A particle effect attached to a projectile
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    pub emitter: ParticleEmitterDef,
    /// Visual size, also used for impact blinks
    pub size: f32,
    pub tint: Color,
}

impl EffectConfig {
    pub fn new(emitter: ParticleEmitterDef, size: f32, tint: Color) -> Self {
        Self { emitter, size, tint }
    }

    pub fn is_continuous(&self) -> bool {
        self.emitter.is_continuous()
    }

    /// Particle count for a one-shot burst of this effect
    pub fn burst_count(&self) -> usize {
        (self.size * 40.0).clamp(4.0, 40.0) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileConfig {
    pub id: String,

    // Visuals
    pub texture: String,
    pub texture_size: f32,
    /// Draw as a beam stretched along the velocity instead of a sprite
    pub stretch: bool,
    /// Radius of the attached light; 0 = no light
    pub light_size: f32,

    // Motion
    pub speed: f32,
    pub acceleration: f32,
    /// Radius of the physics ball; 0 = point body swept analytically
    pub phys_size: f32,
    /// 0 = massless for contact purposes
    pub density: f32,
    /// Ignores planet gravity
    pub massless: bool,
    /// Homing turn rate in radians per second; 0 = unguided
    pub guide_rot_speed: f32,

    // Damage
    pub damage: f32,
    pub damage_type: DamageType,
    /// Seconds a struck ship loses control; 0 = none
    pub em_time: f32,

    // Effects
    pub body_effect: Option<EffectConfig>,
    pub trail_effect: Option<EffectConfig>,
    pub collision_effect: Option<EffectConfig>,
    pub collision_effect_bg: Option<EffectConfig>,
    pub work_sound: Option<String>,
    pub collision_sound: Option<String>,
}

impl ProjectileConfig {
    pub fn is_dense(&self) -> bool {
        self.density > 0.0
    }

    pub fn is_guided(&self) -> bool {
        self.guide_rot_speed != 0.0
    }

    /// Light color follows the body effect's tint when there is one
    pub fn light_color(&self) -> Color {
        self.body_effect.as_ref().map_or(WHITE, |e| e.tint)
    }
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            id: "bolt".to_string(),
            texture: "bolt".to_string(),
            texture_size: 0.1,
            stretch: true,
            light_size: 0.0,
            speed: 10.0,
            acceleration: 0.0,
            phys_size: 0.0,
            density: 0.0,
            massless: true,
            guide_rot_speed: 0.0,
            damage: 5.0,
            damage_type: DamageType::Bullet,
            em_time: 0.0,
            body_effect: None,
            trail_effect: None,
            collision_effect: None,
            collision_effect_bg: None,
            work_sound: None,
            collision_sound: None,
        }
    }
}

//! Game Components
//!
//! Plain data shared by several world objects: health pools, damage types,
//! shields, armor and abilities. Behavior that touches the world lives on the
//! objects themselves.

use serde::{Deserialize, Serialize};

// =============================================================================
// Combat Components
// =============================================================================

/// What kind of hit this is. Armor and shields react differently per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Bullet,
    Energy,
    Explosion,
    /// Physical collision between bodies
    Crash,
    Fire,
}

/// Health component for damageable objects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Returns true if this hit was lethal
    pub fn damage(&mut self, amount: f32) -> bool {
        self.current = (self.current - amount).max(0.0);
        self.current == 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

/// Runtime state of an equipped shield
#[derive(Debug, Clone, PartialEq)]
pub struct ShieldState {
    pub life: f32,
    pub max_life: f32,
    /// Life restored per second once idle long enough
    pub regen_rate: f32,
    /// Seconds without hits before regeneration starts
    pub idle_delay: f32,
    /// Seconds since the last absorbed hit
    pub idle_time: f32,
}

impl ShieldState {
    pub fn new(max_life: f32, regen_rate: f32, idle_delay: f32) -> Self {
        Self {
            life: max_life,
            max_life,
            regen_rate,
            idle_delay,
            idle_time: idle_delay,
        }
    }

    pub fn is_up(&self) -> bool {
        self.life > 0.0
    }

    /// Absorb as much of `amount` as possible. Returns what passes through.
    pub fn absorb(&mut self, amount: f32, dmg_type: DamageType) -> f32 {
        self.idle_time = 0.0;
        if !self.is_up() || dmg_type == DamageType::Fire {
            return amount;
        }
        let taken = amount.min(self.life);
        self.life -= taken;
        amount - taken
    }

    pub fn update(&mut self, time_step: f32) {
        self.idle_time += time_step;
        if self.idle_time >= self.idle_delay {
            self.life = (self.life + self.regen_rate * time_step).min(self.max_life);
        }
    }
}

/// Armor reduces the damage that gets past the shield
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    /// Fraction of bullet/crash/explosion damage removed (0..1)
    pub physical: f32,
    /// Fraction of energy damage removed (0..1)
    pub energy: f32,
}

impl Armor {
    pub fn reduce(&self, amount: f32, dmg_type: DamageType) -> f32 {
        let ratio = match dmg_type {
            DamageType::Bullet | DamageType::Crash | DamageType::Explosion => self.physical,
            DamageType::Energy => self.energy,
            DamageType::Fire => 0.0,
        };
        amount * (1.0 - ratio.clamp(0.0, 1.0))
    }
}

// =============================================================================
// Abilities
// =============================================================================

/// Slows down the whole simulation while active
#[derive(Debug, Clone, PartialEq)]
pub struct SloMo {
    /// Time factor while active (0..1)
    pub factor: f32,
    pub duration: f32,
    pub recharge: f32,
    /// Remaining active time
    pub active_left: f32,
    /// Remaining recharge time
    pub cooldown: f32,
}

impl SloMo {
    pub fn new(factor: f32, duration: f32, recharge: f32) -> Self {
        Self {
            factor,
            duration,
            recharge,
            active_left: 0.0,
            cooldown: 0.0,
        }
    }

    /// Returns true if the ability fired
    pub fn activate(&mut self) -> bool {
        if self.active_left > 0.0 || self.cooldown > 0.0 {
            return false;
        }
        self.active_left = self.duration;
        self.cooldown = self.recharge;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active_left > 0.0
    }

    /// Time factor this ability contributes right now
    pub fn time_factor(&self) -> f32 {
        if self.is_active() {
            self.factor
        } else {
            1.0
        }
    }

    /// Ticks in real time so a slowed world does not stretch the effect
    pub fn update(&mut self, real_step: f32) {
        if self.active_left > 0.0 {
            self.active_left = (self.active_left - real_step).max(0.0);
        } else {
            self.cooldown = (self.cooldown - real_step).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(50.0);
        assert!(!health.damage(10.0));
        assert_eq!(health.current, 40.0);
        assert_eq!(health.fraction(), 0.8);
        assert!(health.damage(80.0));
        assert!(health.is_dead());
    }

    #[test]
    fn test_shield_absorbs_then_regenerates() {
        let mut shield = ShieldState::new(20.0, 10.0, 1.0);
        let through = shield.absorb(30.0, DamageType::Bullet);
        assert_eq!(through, 10.0);
        assert!(!shield.is_up());

        // Still idle-delayed
        shield.update(0.5);
        assert_eq!(shield.life, 0.0);

        shield.update(0.5);
        shield.update(0.5);
        assert!(shield.is_up());
    }

    #[test]
    fn test_armor_ignores_fire() {
        let armor = Armor { physical: 0.5, energy: 0.25 };
        assert_eq!(armor.reduce(10.0, DamageType::Bullet), 5.0);
        assert_eq!(armor.reduce(8.0, DamageType::Energy), 6.0);
        assert_eq!(armor.reduce(10.0, DamageType::Fire), 10.0);
    }

    #[test]
    fn test_slomo_cycle() {
        let mut slomo = SloMo::new(0.5, 1.0, 2.0);
        assert!(slomo.activate());
        assert_eq!(slomo.time_factor(), 0.5);
        assert!(!slomo.activate());

        slomo.update(1.0);
        assert_eq!(slomo.time_factor(), 1.0);
        assert!(!slomo.activate(), "still recharging");

        slomo.update(2.0);
        assert!(slomo.activate());
    }
}

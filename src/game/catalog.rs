//! Content Catalog
//!
//! Built-in hulls, items, projectiles and ship loadouts. Everything is built
//! once at startup and handed out as shared, read-only templates.

use std::collections::HashMap;
use std::sync::Arc;

use macroquad::color::Color;

use super::components::{Armor, DamageType};
use super::item::{EquipState, GunSpec, Item, ItemKind, ShieldSpec};
use super::particles::ParticleEmitterDef;
use super::projectile::{EffectConfig, ProjectileConfig};

/// Slow-motion ability a hull may carry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SloMoSpec {
    pub factor: f32,
    pub duration: f32,
    pub recharge: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HullConfig {
    pub id: String,
    pub texture: String,
    /// Collision radius
    pub radius: f32,
    pub density: f32,
    pub max_health: f32,
    /// Acceleration while thrusting
    pub thrust: f32,
    /// Radians per second
    pub rot_speed: f32,
    pub max_speed: f32,
    /// 1 or 2 gun mounts
    pub gun_slots: u8,
    pub ability: Option<SloMoSpec>,
}

impl HullConfig {
    /// Radius of the shield sensor ring
    pub fn shield_radius(&self) -> f32 {
        self.radius * 1.4
    }
}

/// A ready-to-fly ship: hull, loadout and purse
#[derive(Debug, Clone, PartialEq)]
pub struct ShipConfig {
    pub hull: String,
    pub items: Vec<(String, EquipState)>,
    pub money: f32,
}

#[derive(Debug, Default)]
pub struct Catalog {
    hulls: HashMap<String, Arc<HullConfig>>,
    items: HashMap<String, Item>,
    projectiles: HashMap<String, Arc<ProjectileConfig>>,
    ships: HashMap<String, ShipConfig>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hull(&self, id: &str) -> Option<Arc<HullConfig>> {
        self.hulls.get(id).cloned()
    }

    /// A fresh, unequipped copy of the item
    pub fn item(&self, id: &str) -> Option<Item> {
        self.items.get(id).cloned()
    }

    pub fn projectile(&self, id: &str) -> Option<Arc<ProjectileConfig>> {
        self.projectiles.get(id).cloned()
    }

    pub fn ship(&self, id: &str) -> Option<&ShipConfig> {
        self.ships.get(id)
    }

    pub fn add_hull(&mut self, hull: HullConfig) {
        self.hulls.insert(hull.id.clone(), Arc::new(hull));
    }

    /// Guns should fire projectiles registered here first
    pub fn add_item(&mut self, item: Item) {
        if let ItemKind::Gun(gun) = &item.kind {
            if self.projectile(&gun.projectile.id).is_none() {
                log::warn!("gun '{}' fires unregistered projectile '{}'", item.id, gun.projectile.id);
            }
        }
        self.items.insert(item.id.clone(), item);
    }

    pub fn add_projectile(&mut self, projectile: ProjectileConfig) -> Arc<ProjectileConfig> {
        let shared = Arc::new(projectile);
        self.projectiles.insert(shared.id.clone(), shared.clone());
        shared
    }

    pub fn add_ship(&mut self, id: impl Into<String>, ship: ShipConfig) {
        self.ships.insert(id.into(), ship);
    }

    /// Instantiate the items of a loadout, keeping their equip marks.
    /// Unknown ids are logged and skipped.
    pub fn build_items(&self, loadout: &[(String, EquipState)]) -> Vec<Item> {
        loadout
            .iter()
            .filter_map(|(id, equipped)| match self.item(id) {
                Some(mut item) => {
                    item.equipped = *equipped;
                    Some(item)
                }
                None => {
                    log::warn!("unknown item id '{}' skipped", id);
                    None
                }
            })
            .collect()
    }

    // =========================================================================
    // Built-in content
    // =========================================================================

    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.add_hull(HullConfig {
            id: "scout".to_string(),
            texture: "hull-scout".to_string(),
            radius: 0.4,
            density: 1.0,
            max_health: 50.0,
            thrust: 3.0,
            rot_speed: 3.5,
            max_speed: 4.0,
            gun_slots: 2,
            ability: Some(SloMoSpec {
                factor: 0.4,
                duration: 3.0,
                recharge: 12.0,
            }),
        });
        catalog.add_hull(HullConfig {
            id: "raider".to_string(),
            texture: "hull-raider".to_string(),
            radius: 0.35,
            density: 1.0,
            max_health: 30.0,
            thrust: 2.5,
            rot_speed: 3.0,
            max_speed: 3.5,
            gun_slots: 1,
            ability: None,
        });
        catalog.add_hull(HullConfig {
            id: "gunship".to_string(),
            texture: "hull-gunship".to_string(),
            radius: 0.7,
            density: 2.0,
            max_health: 120.0,
            thrust: 1.5,
            rot_speed: 1.5,
            max_speed: 2.5,
            gun_slots: 2,
            ability: None,
        });

        let bolt = catalog.add_projectile(ProjectileConfig {
            id: "bolt".to_string(),
            texture: "proj-bolt".to_string(),
            texture_size: 0.06,
            stretch: true,
            speed: 9.0,
            damage: 5.0,
            damage_type: DamageType::Bullet,
            collision_effect: Some(EffectConfig::new(ParticleEmitterDef::sparks(), 0.2, Color::new(1.0, 0.9, 0.6, 1.0))),
            collision_sound: Some("bolt-hit".to_string()),
            ..ProjectileConfig::default()
        });
        let plasma = catalog.add_projectile(ProjectileConfig {
            id: "plasma".to_string(),
            texture: "proj-plasma".to_string(),
            texture_size: 0.15,
            stretch: false,
            light_size: 0.4,
            speed: 5.0,
            damage: 12.0,
            damage_type: DamageType::Energy,
            phys_size: 0.08,
            body_effect: Some(EffectConfig::new(ParticleEmitterDef::plasma_glow(), 0.15, Color::new(0.5, 0.85, 1.0, 1.0))),
            collision_effect: Some(EffectConfig::new(ParticleEmitterDef::sparks(), 0.3, Color::new(0.5, 0.85, 1.0, 1.0))),
            collision_effect_bg: Some(EffectConfig::new(ParticleEmitterDef::fire(), 0.4, Color::new(0.3, 0.5, 1.0, 1.0))),
            work_sound: Some("plasma-hum".to_string()),
            collision_sound: Some("plasma-hit".to_string()),
            ..ProjectileConfig::default()
        });
        let missile = catalog.add_projectile(ProjectileConfig {
            id: "missile".to_string(),
            texture: "proj-missile".to_string(),
            texture_size: 0.2,
            stretch: false,
            light_size: 0.25,
            speed: 2.0,
            acceleration: 3.0,
            massless: false,
            guide_rot_speed: 2.5,
            damage: 25.0,
            damage_type: DamageType::Explosion,
            trail_effect: Some(EffectConfig::new(ParticleEmitterDef::smoke_trail(), 0.1, Color::new(0.7, 0.7, 0.7, 1.0))),
            collision_effect: Some(EffectConfig::new(ParticleEmitterDef::fire(), 0.6, Color::new(1.0, 0.6, 0.2, 1.0))),
            collision_sound: Some("missile-hit".to_string()),
            ..ProjectileConfig::default()
        });
        let slug = catalog.add_projectile(ProjectileConfig {
            id: "slug".to_string(),
            texture: "proj-slug".to_string(),
            texture_size: 0.12,
            stretch: false,
            speed: 6.0,
            phys_size: 0.06,
            density: 4.0,
            massless: false,
            damage: 10.0,
            damage_type: DamageType::Bullet,
            collision_effect: Some(EffectConfig::new(ParticleEmitterDef::sparks(), 0.3, Color::new(1.0, 1.0, 1.0, 1.0))),
            collision_sound: Some("slug-hit".to_string()),
            ..ProjectileConfig::default()
        });
        let emp = catalog.add_projectile(ProjectileConfig {
            id: "emp".to_string(),
            texture: "proj-emp".to_string(),
            texture_size: 0.1,
            speed: 7.0,
            damage: 2.0,
            damage_type: DamageType::Energy,
            em_time: 2.0,
            collision_sound: Some("emp-hit".to_string()),
            ..ProjectileConfig::default()
        });

        let guns = [
            ("blaster", 40.0, bolt, 0.25, true),
            ("plasma-cannon", 120.0, plasma, 0.6, false),
            ("missile-rack", 200.0, missile, 1.5, false),
            ("slug-thrower", 90.0, slug, 0.8, true),
            ("emp-emitter", 150.0, emp, 2.0, false),
        ];
        for (id, price, projectile, reload, vary_speed) in guns {
            catalog.add_item(Item::new(
                id,
                price,
                ItemKind::Gun(GunSpec {
                    projectile,
                    reload,
                    vary_speed,
                    shot_sound: Some(format!("{}-shot", id)),
                }),
            ));
        }
        catalog.add_item(Item::new(
            "light-shield",
            60.0,
            ItemKind::Shield(ShieldSpec {
                max_life: 20.0,
                regen_rate: 4.0,
                idle_delay: 3.0,
            }),
        ));
        catalog.add_item(Item::new(
            "plating",
            50.0,
            ItemKind::Armor(Armor {
                physical: 0.3,
                energy: 0.1,
            }),
        ));
        catalog.add_item(Item::new("ore", 8.0, ItemKind::Commodity));

        let loadout = |items: &[(&str, EquipState)]| -> Vec<(String, EquipState)> {
            items.iter().map(|(id, e)| (id.to_string(), *e)).collect()
        };
        catalog.add_ship(
            "starter",
            ShipConfig {
                hull: "scout".to_string(),
                items: loadout(&[
                    ("blaster", EquipState::Primary),
                    ("missile-rack", EquipState::Secondary),
                    ("light-shield", EquipState::Primary),
                    ("ore", EquipState::None),
                ]),
                money: 1000.0,
            },
        );
        catalog.add_ship(
            "pirate",
            ShipConfig {
                hull: "raider".to_string(),
                items: loadout(&[("blaster", EquipState::Primary)]),
                money: 60.0,
            },
        );
        catalog.add_ship(
            "pirate-heavy",
            ShipConfig {
                hull: "gunship".to_string(),
                items: loadout(&[
                    ("plasma-cannon", EquipState::Primary),
                    ("emp-emitter", EquipState::Secondary),
                    ("plating", EquipState::Primary),
                ]),
                money: 250.0,
            },
        );

        catalog
    }
}

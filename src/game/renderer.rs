//! Game Renderer
//!
//! Draws a session with macroquad: world-space drawables and particles under
//! a `Camera2D` that follows the game camera, then the HUD and, when open,
//! the map overlay in screen space.
//!
//! There are no texture assets; sprites are drawn as flat shapes picked by
//! texture name.

use macroquad::prelude::*;

use super::camera::{GameCamera, MapView};
use super::config::SUN_HOT_RADIUS;
use super::drawable::Drawable;
use super::event::{EffectEvent, Events};
use super::object::{FarObject, ObjectKind};
use super::particles::{ParticleEmitterDef, ParticlePool};
use super::runtime::{FpsLimit, FrameTimings};
use super::session::GameSession;

/// World units visible across the map height at map zoom 1
const MAP_VIEW_HEIGHT: f32 = 240.0;

const BACKGROUND: Color = Color::new(0.02, 0.02, 0.05, 1.0);

/// World camera for the current screen size
pub fn world_camera(camera: &GameCamera) -> Camera2D {
    view_camera(camera.position, camera.view_height())
}

fn view_camera(target: Vec2, view_height: f32) -> Camera2D {
    let aspect = screen_width() / screen_height().max(1.0);
    Camera2D {
        target,
        zoom: vec2(2.0 / (view_height * aspect), 2.0 / view_height),
        ..Default::default()
    }
}

pub struct Renderer {
    particles: ParticlePool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            particles: ParticlePool::new(),
        }
    }

    /// Turn this frame's effect events into particles
    pub fn absorb_effects(&mut self, events: &mut Events) {
        if !events.effects.is_empty() {
            log::trace!("{} effects this frame", events.effects.len());
        }
        for effect in events.effects.drain() {
            match effect {
                EffectEvent::Burst {
                    emitter,
                    position,
                    velocity,
                    count,
                } => self.particles.spawn_burst(&emitter, position, velocity, count),
                EffectEvent::Impact { position, size, blinks } => {
                    let count = if blinks { 12 } else { 6 };
                    let def = ParticleEmitterDef {
                        size: size * 0.2,
                        ..ParticleEmitterDef::sparks()
                    };
                    self.particles.spawn_burst(&def, position, Vec2::ZERO, count);
                }
                EffectEvent::Explosion { position, size } => {
                    let def = ParticleEmitterDef {
                        speed_max: 2.5 * size.max(0.5),
                        ..ParticleEmitterDef::fire()
                    };
                    self.particles.spawn_burst(&def, position, Vec2::ZERO, (size * 40.0) as usize + 10);
                }
            }
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.alive_count()
    }

    /// Particles age in real time so they settle while the game is paused
    pub fn update(&mut self, real_step: f32) {
        self.particles.update(real_step);
    }

    pub fn draw(&self, session: &GameSession) {
        clear_background(BACKGROUND);

        let camera = session.camera();
        set_camera(&world_camera(camera));
        draw_stars(session);
        // Anything farther than a screen width from the centre is off screen
        let reach = camera.view_height() * screen_width() / screen_height().max(1.0);
        for drawable in session.drawables() {
            if drawable.position().distance(camera.position) <= reach {
                draw_drawable(&drawable);
            }
        }
        self.particles.render();
        set_default_camera();

        if session.map().visible {
            draw_map(session, session.map());
            set_default_camera();
        }
        draw_hud(session);
    }

    /// Frame timing and world statistics in the top-right corner
    pub fn draw_timings(&self, session: &GameSession, timings: &FrameTimings, limit: FpsLimit) {
        let objects = session.objects();
        let lines = [
            format!(
                "fps {} ({}) | in {:.1} sim {:.1} draw {:.1} ms",
                get_fps(),
                limit.label(),
                timings.input_ms,
                timings.logic_ms,
                timings.render_ms
            ),
            format!(
                "seed {} | {} live {} far | {} bodies | {} particles",
                session.seed(),
                objects.live_count(),
                objects.far_objects().len(),
                objects.physics().body_count(),
                self.particle_count()
            ),
        ];
        for (i, text) in lines.iter().enumerate() {
            let dims = measure_text(text, None, 14, 1.0);
            draw_text(text, screen_width() - dims.width - 12.0, 18.0 + i as f32 * 16.0, 14.0, GRAY);
        }
    }
}

// =============================================================================
// World layer
// =============================================================================

fn draw_stars(session: &GameSession) {
    for system in session.planets().systems() {
        draw_circle(system.position.x, system.position.y, SUN_HOT_RADIUS * 0.4, Color::new(1.0, 0.8, 0.3, 1.0));
        draw_circle_lines(system.position.x, system.position.y, SUN_HOT_RADIUS, 0.05, Color::new(1.0, 0.5, 0.2, 0.3));
        for planet in &system.planets {
            let p = planet.position();
            draw_circle(p.x, p.y, planet.radius, Color::new(0.3, 0.45, 0.6, 1.0));
        }
    }
}

/// Flat color standing in for a texture
fn sprite_color(texture: &str) -> Color {
    if texture.starts_with("hull-") {
        Color::new(0.8, 0.85, 0.9, 1.0)
    } else if texture.starts_with("proj-") {
        Color::new(1.0, 0.95, 0.7, 1.0)
    } else if texture.starts_with("station") {
        Color::new(0.6, 0.7, 0.6, 1.0)
    } else if texture.starts_with("loot") {
        Color::new(1.0, 0.85, 0.2, 1.0)
    } else {
        Color::new(0.5, 0.45, 0.4, 1.0)
    }
}

fn multiply(a: Color, b: Color) -> Color {
    Color::new(a.r * b.r, a.g * b.g, a.b * b.b, a.a * b.a)
}

fn draw_drawable(drawable: &Drawable) {
    match drawable {
        Drawable::Sprite {
            texture,
            position,
            size,
            angle,
            tint,
        } => {
            let color = multiply(sprite_color(texture), *tint);
            let half = size * 0.5;
            if texture.starts_with("hull-") {
                // Nose points along the heading
                let dir = Vec2::from_angle(*angle);
                let side = dir.perp() * half * 0.7;
                let nose = *position + dir * half;
                let tail = *position - dir * half;
                draw_triangle(nose, tail + side, tail - side, color);
            } else if texture.starts_with("station") {
                draw_poly(position.x, position.y, 6, half, angle.to_degrees(), color);
            } else {
                draw_circle(position.x, position.y, half, color);
            }
        }
        Drawable::Beam {
            texture,
            position,
            length,
            width,
            angle,
            tint,
        } => {
            let color = multiply(sprite_color(texture), *tint);
            let tail = *position - Vec2::from_angle(*angle) * *length;
            draw_line(tail.x, tail.y, position.x, position.y, *width, color);
        }
        Drawable::Light {
            position,
            radius,
            intensity,
            color,
        } => {
            let c = Color::new(color.r, color.g, color.b, color.a * intensity * 0.35);
            draw_circle(position.x, position.y, *radius, c);
        }
        Drawable::Glow { position, radius, color } => {
            draw_circle_lines(position.x, position.y, *radius, 0.03, *color);
        }
    }
}

// =============================================================================
// Map overlay
// =============================================================================

fn draw_map(session: &GameSession, map: &MapView) {
    set_default_camera();
    draw_rectangle(0.0, 0.0, screen_width(), screen_height(), Color::new(0.0, 0.0, 0.0, 0.75));

    let center = session.camera().position;
    set_camera(&view_camera(center, MAP_VIEW_HEIGHT / map.zoom));
    let icon = MAP_VIEW_HEIGHT / map.zoom * 0.01;
    let alpha = map.icon_alpha();

    for system in session.planets().systems() {
        draw_circle(system.position.x, system.position.y, SUN_HOT_RADIUS * 0.4, ORANGE);
        for planet in &system.planets {
            let p = planet.position();
            draw_circle_lines(system.position.x, system.position.y, planet.orbit_radius, icon * 0.2, DARKGRAY);
            draw_circle(p.x, p.y, planet.radius, Color::new(0.3, 0.45, 0.6, 1.0));
        }
    }

    for far in session.objects().far_objects() {
        let p = far.position();
        let color = match far {
            FarObject::Ship(_) => Color::new(1.0, 0.3, 0.3, alpha),
            FarObject::Station { .. } => Color::new(0.4, 1.0, 0.4, 1.0),
            FarObject::Asteroid { .. } => Color::new(0.5, 0.5, 0.5, 0.6),
            FarObject::Loot { .. } => Color::new(1.0, 0.85, 0.2, alpha),
        };
        draw_circle(p.x, p.y, icon, color);
    }

    let physics = session.objects().physics();
    for (id, object) in session.objects().objects() {
        let p = object.position(physics);
        let color = match object.kind() {
            ObjectKind::Projectile => continue,
            _ if session.hero_id() == Some(id) => continue,
            ObjectKind::Ship => Color::new(1.0, 0.3, 0.3, alpha),
            ObjectKind::Station => Color::new(0.4, 1.0, 0.4, 1.0),
            ObjectKind::Asteroid => Color::new(0.5, 0.5, 0.5, 0.6),
            ObjectKind::Loot => Color::new(1.0, 0.85, 0.2, alpha),
        };
        draw_circle(p.x, p.y, icon, color);
    }

    if let Some(hero) = session.hero_position() {
        draw_circle(hero.x, hero.y, icon * 1.5, WHITE);
    }
}

// =============================================================================
// HUD
// =============================================================================

fn draw_hud(session: &GameSession) {
    let text_color = Color::from_rgba(200, 205, 215, 255);
    let mut y = 24.0;
    let mut line = |text: &str| {
        draw_text(text, 16.0, y, 20.0, text_color);
        y += 22.0;
    };

    match session.hero_ship() {
        Some(ship) => {
            let health = ship.health();
            line(&format!("Hull {:.0}/{:.0} ({:.0}%)", health.current, health.max, health.fraction() * 100.0));
            if let Some(shield) = ship.shield() {
                line(&format!("Shield {:.0}/{:.0}", shield.life, shield.max_life));
            }
            line(&format!("Money {:.0}", ship.money()));
            if ship.controls_disabled() {
                line("CONTROLS DISABLED");
            }
        }
        None if session.hero().is_transcendent() => line("Transcendent - L to land, R to respawn"),
        None if !session.hero().is_alive() => line("Destroyed - R to respawn"),
        None => {}
    }
    if let Some(threat) = session.nearest_threat() {
        line(&format!("Nearest hostile {:.0}", threat.distance));
    }
    if session.time_factor() != 1.0 {
        line(&format!("Time x{:.2}", session.time_factor()));
    }

    if session.is_paused() {
        let label = "PAUSED";
        let dims = measure_text(label, None, 40, 1.0);
        draw_text(
            label,
            (screen_width() - dims.width) / 2.0,
            screen_height() / 2.0,
            40.0,
            WHITE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_become_particles() {
        let mut renderer = Renderer::new();
        let mut events = Events::new();
        events.effects.send(EffectEvent::Impact {
            position: Vec2::ZERO,
            size: 0.3,
            blinks: false,
        });
        events.effects.send(EffectEvent::Explosion {
            position: Vec2::new(1.0, 1.0),
            size: 1.0,
        });

        renderer.absorb_effects(&mut events);
        assert!(events.effects.is_empty());
        assert_eq!(renderer.particle_count(), 6 + 50);

        renderer.update(10.0);
        assert_eq!(renderer.particle_count(), 0);
    }

    #[test]
    fn test_sprite_colors_by_texture_family() {
        assert_ne!(sprite_color("hull-scout"), sprite_color("asteroid"));
        assert_eq!(sprite_color("hull-scout"), sprite_color("hull-raider"));
    }
}

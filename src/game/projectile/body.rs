//! Projectile bodies
//!
//! A point body is a bare position and velocity moved kinematically; its hits
//! are found by sweeping the segment it travelled this frame. A ball body is a
//! real rapier body and its hits come from the contact listener. Either way
//! the heading always equals the direction of travel.

use macroquad::math::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use super::config::ProjectileConfig;
use crate::game::entity::ObjectId;
use crate::game::physics::{BodyDesc, ColliderMode, ColliderTag, PhysicsWorld};

/// Normalize an angle to (-PI, PI]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// Heading of a velocity vector (0 along +x)
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Closest-approach parameter (0..1) along `p0 → p1` if the segment touches
/// the circle, `None` otherwise.
pub fn segment_hits_circle(p0: Vec2, p1: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = p1 - p0;
    let m = p0 - center;
    let a = d.dot(d);
    if a <= 1e-6 {
        return (m.length() <= radius).then_some(0.0);
    }
    let t = (-(m.dot(d)) / a).clamp(0.0, 1.0);
    let closest = p0 + d * t;
    ((closest - center).length() <= radius).then_some(t)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointBody {
    pub position: Vec2,
    pub velocity: Vec2,
    acceleration: f32,
}

impl PointBody {
    /// Advance one step. Returns the segment travelled.
    fn advance(&mut self, time_step: f32) -> (Vec2, Vec2) {
        let from = self.position;
        if self.acceleration != 0.0 {
            let dir = self.velocity.normalize_or_zero();
            self.velocity += dir * self.acceleration * time_step;
        }
        self.position += self.velocity * time_step;
        (from, self.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BallBody {
    pub handle: RigidBodyHandle,
    acceleration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileBody {
    Point(PointBody),
    Ball(BallBody),
}

impl ProjectileBody {
    /// Pick the body variant from the config's physical size.
    pub fn new(
        physics: &mut PhysicsWorld,
        owner: ObjectId,
        muzzle_pos: Vec2,
        angle: f32,
        gun_velocity: Vec2,
        speed: f32,
        config: &ProjectileConfig,
    ) -> Self {
        let velocity = gun_velocity + Vec2::from_angle(angle) * speed;

        if config.phys_size > 0.0 {
            let mut desc = BodyDesc::dynamic(muzzle_pos, angle_of(velocity), velocity);
            desc.ccd = true;
            let handle = physics.create_body(desc);
            let mode = if config.is_dense() { ColliderMode::Solid } else { ColliderMode::Ghost };
            let density = if config.is_dense() { config.density } else { 1.0 };
            physics.add_ball_collider(handle, config.phys_size, density, ColliderTag::hull(owner), mode);
            ProjectileBody::Ball(BallBody {
                handle,
                acceleration: config.acceleration,
            })
        } else {
            ProjectileBody::Point(PointBody {
                position: muzzle_pos,
                velocity,
                acceleration: config.acceleration,
            })
        }
    }

    /// Move one step. Point bodies return the segment they swept.
    pub fn update(&mut self, physics: &mut PhysicsWorld, time_step: f32) -> Option<(Vec2, Vec2)> {
        match self {
            ProjectileBody::Point(point) => Some(point.advance(time_step)),
            ProjectileBody::Ball(ball) => {
                let velocity = physics.velocity(ball.handle);
                if ball.acceleration != 0.0 {
                    let dir = velocity.normalize_or_zero();
                    physics.accelerate(ball.handle, dir * ball.acceleration, time_step);
                }
                let velocity = physics.velocity(ball.handle);
                if velocity.length_squared() > 0.0 {
                    physics.set_angle(ball.handle, angle_of(velocity));
                }
                None
            }
        }
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        match self {
            ProjectileBody::Point(point) => point.position,
            ProjectileBody::Ball(ball) => physics.position(ball.handle),
        }
    }

    pub fn velocity(&self, physics: &PhysicsWorld) -> Vec2 {
        match self {
            ProjectileBody::Point(point) => point.velocity,
            ProjectileBody::Ball(ball) => physics.velocity(ball.handle),
        }
    }

    pub fn angle(&self, physics: &PhysicsWorld) -> f32 {
        match self {
            ProjectileBody::Point(point) => angle_of(point.velocity),
            ProjectileBody::Ball(ball) => physics.angle(ball.handle),
        }
    }

    /// Heading that would point straight at `target`
    pub fn desired_angle(&self, physics: &PhysicsWorld, target: Vec2) -> f32 {
        angle_of(target - self.position(physics))
    }

    /// Turn the direction of travel by `delta` radians, keeping speed
    pub fn change_angle(&mut self, physics: &mut PhysicsWorld, delta: f32) {
        let rotation = Vec2::from_angle(delta);
        match self {
            ProjectileBody::Point(point) => {
                point.velocity = rotation.rotate(point.velocity);
            }
            ProjectileBody::Ball(ball) => {
                let velocity = rotation.rotate(physics.velocity(ball.handle));
                physics.set_velocity(ball.handle, velocity);
                let angle = physics.angle(ball.handle);
                physics.set_angle(ball.handle, normalize_angle(angle + delta));
            }
        }
    }

    /// Apply a force (or an acceleration when `is_acceleration`)
    pub fn receive_force(&mut self, physics: &mut PhysicsWorld, force: Vec2, time_step: f32, is_acceleration: bool) {
        match self {
            // Point bodies have no mass, so a force acts as acceleration
            ProjectileBody::Point(point) => point.velocity += force * time_step,
            ProjectileBody::Ball(ball) => {
                if is_acceleration {
                    physics.accelerate(ball.handle, force, time_step);
                } else {
                    physics.apply_impulse(ball.handle, force * time_step);
                }
            }
        }
    }

    pub fn on_remove(&mut self, physics: &mut PhysicsWorld) {
        if let ProjectileBody::Ball(ball) = self {
            physics.remove_body(ball.handle);
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, ProjectileBody::Point(_))
    }
}

//! Physics World
//!
//! Thin wrapper over a rapier2d pipeline. Space has no global gravity;
//! planets pull objects explicitly during the world-content update.
//!
//! Colliders carry a `ColliderTag` in their user data so contact events can
//! be mapped back to world objects. The engine reports contacts through
//! `ContactCollector`, which only buffers them. Nothing touches gameplay
//! state from inside the physics step.

use std::sync::Mutex;

use macroquad::math::Vec2;
use rapier2d::prelude::*;

use super::entity::ObjectId;

// =============================================================================
// Collider tags
// =============================================================================

/// Which part of an object a collider represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Hull,
    /// Sensor ring around a ship; only meaningful while the shield is up
    Shield,
}

/// Owner and part of a collider, packed into its user data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderTag {
    pub owner: ObjectId,
    pub part: BodyPart,
}

impl ColliderTag {
    pub fn hull(owner: ObjectId) -> Self {
        Self { owner, part: BodyPart::Hull }
    }

    pub fn shield(owner: ObjectId) -> Self {
        Self { owner, part: BodyPart::Shield }
    }

    pub fn to_user_data(self) -> u128 {
        let part = match self.part {
            BodyPart::Hull => 0u128,
            BodyPart::Shield => 1u128,
        };
        (part << 64) | self.owner.to_bits() as u128
    }

    pub fn from_user_data(data: u128) -> Self {
        let part = if (data >> 64) & 1 == 1 { BodyPart::Shield } else { BodyPart::Hull };
        Self {
            owner: ObjectId::from_bits(data as u64),
            part,
        }
    }
}

// =============================================================================
// Contact buffering
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactKind {
    /// Two colliders started touching
    Begin,
    /// A solid contact pushed the bodies apart this hard
    Impulse { magnitude: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub a: ColliderTag,
    pub b: ColliderTag,
    pub kind: ContactKind,
}

/// Receives engine callbacks during `step` and queues them for later.
#[derive(Default)]
pub struct ContactCollector {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactCollector {
    fn push(&self, colliders: &ColliderSet, h1: ColliderHandle, h2: ColliderHandle, kind: ContactKind) {
        let (Some(c1), Some(c2)) = (colliders.get(h1), colliders.get(h2)) else {
            log::debug!("contact against a removed collider dropped");
            return;
        };
        let event = ContactEvent {
            a: ColliderTag::from_user_data(c1.user_data),
            b: ColliderTag::from_user_data(c2.user_data),
            kind,
        };
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }

    pub fn drain(&self) -> Vec<ContactEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if event.started() {
            self.push(colliders, event.collider1(), event.collider2(), ContactKind::Begin);
        }
    }

    fn handle_contact_force_event(
        &self,
        dt: Real,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        contact_pair: &ContactPair,
        total_force_magnitude: Real,
    ) {
        self.push(
            colliders,
            contact_pair.collider1,
            contact_pair.collider2,
            ContactKind::Impulse { magnitude: total_force_magnitude * dt },
        );
    }
}

// =============================================================================
// Body construction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    /// Immovable (stations)
    Fixed,
}

#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    /// Rotation is driven by gameplay code, not contacts
    pub lock_rotation: bool,
    /// Continuous collision detection for fast movers
    pub ccd: bool,
}

impl BodyDesc {
    pub fn dynamic(position: Vec2, angle: f32, velocity: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position,
            angle,
            velocity,
            lock_rotation: false,
            ccd: false,
        }
    }

    pub fn fixed(position: Vec2, angle: f32) -> Self {
        Self {
            kind: BodyKind::Fixed,
            position,
            angle,
            velocity: Vec2::ZERO,
            lock_rotation: true,
            ccd: false,
        }
    }
}

/// How a collider takes part in contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderMode {
    /// Detects and resolves contacts
    Solid,
    /// Detects contacts but never pushes anything
    Ghost,
    /// Overlap-only volume
    Sensor,
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

// =============================================================================
// Physics world
// =============================================================================

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    collector: ContactCollector,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            collector: ContactCollector::default(),
        }
    }

    /// Advance the simulation. Contacts are buffered, see `drain_contacts`.
    pub fn step(&mut self, time_step: f32) {
        if time_step <= 0.0 {
            return;
        }
        self.params.dt = time_step;

        self.pipeline.step(
            &vector![0.0, 0.0],
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.collector,
        );
    }

    pub fn drain_contacts(&self) -> Vec<ContactEvent> {
        self.collector.drain()
    }

    pub fn create_body(&mut self, desc: BodyDesc) -> RigidBodyHandle {
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(to_vector(desc.position))
            .rotation(desc.angle)
            .linvel(to_vector(desc.velocity))
            .ccd_enabled(desc.ccd);
        if desc.lock_rotation {
            builder = builder.lock_rotations();
        }
        self.bodies.insert(builder.build())
    }

    pub fn add_ball_collider(
        &mut self,
        body: RigidBodyHandle,
        radius: f32,
        density: f32,
        tag: ColliderTag,
        mode: ColliderMode,
    ) -> ColliderHandle {
        let mut builder = ColliderBuilder::ball(radius)
            .density(density)
            .user_data(tag.to_user_data())
            .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
            .contact_force_event_threshold(0.0);
        match mode {
            ColliderMode::Solid => {}
            ColliderMode::Ghost => builder = builder.solver_groups(InteractionGroups::none()),
            ColliderMode::Sensor => builder = builder.sensor(true),
        }
        self.colliders.insert_with_parent(builder.build(), body, &mut self.bodies)
    }

    /// Remove a body together with its colliders
    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        self.bodies.remove(
            body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    // =========================================================================
    // Body queries
    // =========================================================================

    pub fn position(&self, body: RigidBodyHandle) -> Vec2 {
        self.bodies
            .get(body)
            .map_or(Vec2::ZERO, |b| from_vector(b.translation()))
    }

    pub fn angle(&self, body: RigidBodyHandle) -> f32 {
        self.bodies.get(body).map_or(0.0, |b| b.rotation().angle())
    }

    pub fn velocity(&self, body: RigidBodyHandle) -> Vec2 {
        self.bodies.get(body).map_or(Vec2::ZERO, |b| from_vector(b.linvel()))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // =========================================================================
    // Body mutation
    // =========================================================================

    pub fn set_angle(&mut self, body: RigidBodyHandle, angle: f32) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.set_rotation(Rotation::new(angle), true);
        }
    }

    pub fn set_velocity(&mut self, body: RigidBodyHandle, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.set_linvel(to_vector(velocity), true);
        }
    }

    pub fn apply_impulse(&mut self, body: RigidBodyHandle, impulse: Vec2) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.apply_impulse(to_vector(impulse), true);
        }
    }

    /// Change velocity by `acceleration × time_step`, independent of mass
    pub fn accelerate(&mut self, body: RigidBodyHandle, acceleration: Vec2, time_step: f32) {
        if let Some(b) = self.bodies.get_mut(body) {
            let v = *b.linvel() + to_vector(acceleration * time_step);
            b.set_linvel(v, true);
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

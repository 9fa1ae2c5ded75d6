//! Event System
//!
//! World objects never talk to the particle system or the audio backend
//! directly. They send events that the host drains once per frame:
//!
//! 1. Projectile hits a ship → sends an `Impact` effect and a hit sound
//! 2. Session drains effects → spawns particles
//! 3. Host drains sounds → plays them (or ignores them, headless)
//!
//! Sending never fails and never blocks the simulation.

use macroquad::math::Vec2;

use super::entity::ObjectId;
use super::particles::ParticleEmitterDef;

/// A queue for events of a single type.
/// Events are collected during the frame and drained at specific points.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Send an event (add to queue)
    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Container for all outgoing side effects of a frame.
#[derive(Debug, Default)]
pub struct Events {
    /// Visual effects to spawn
    pub effects: EventQueue<EffectEvent>,

    /// Sounds to play
    pub sounds: EventQueue<SoundEvent>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_all(&mut self) {
        self.effects.clear();
        self.sounds.clear();
    }
}

// =============================================================================
// Event Types
// =============================================================================

#[derive(Debug, Clone)]
pub enum EffectEvent {
    /// One-shot particle burst
    Burst {
        emitter: ParticleEmitterDef,
        position: Vec2,
        /// Velocity the particles inherit
        velocity: Vec2,
        count: usize,
    },
    /// A projectile struck something
    Impact {
        position: Vec2,
        size: f32,
        /// Short bright flashes around the impact point
        blinks: bool,
    },
    /// Something was destroyed
    Explosion { position: Vec2, size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub sound: String,
    pub position: Vec2,
    /// Emitting object, for looping sounds that follow their source
    pub source: Option<ObjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue() {
        let mut queue: EventQueue<i32> = EventQueue::new();

        queue.send(1);
        queue.send(2);
        queue.send(3);

        assert_eq!(queue.len(), 3);

        let collected: Vec<_> = queue.drain().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_events_container() {
        let mut events = Events::new();

        events.sounds.send(SoundEvent {
            sound: "hit".to_string(),
            position: Vec2::ZERO,
            source: None,
        });
        events.effects.send(EffectEvent::Explosion {
            position: Vec2::ZERO,
            size: 1.0,
        });

        assert_eq!(events.sounds.len(), 1);
        assert_eq!(events.effects.len(), 1);

        events.clear_all();
        assert!(events.sounds.is_empty());
        assert!(events.effects.is_empty());
    }
}

//! Contact Dispatch
//!
//! Turns buffered physics contacts into gameplay: projectiles learn their
//! obstacle, ships pick up loot, and hard collisions deal crash damage.
//! Runs between the physics step and the object update pass. Nothing here
//! adds or removes objects.

use macroquad::math::Vec2;

use super::components::DamageType;
use super::config::{CRASH_DAMAGE_FACTOR, CRASH_IMPULSE_THRESHOLD};
use super::entity::ObjectId;
use super::event::Events;
use super::object::{ContactProfile, ObjectKind, WorldObject};
use super::physics::{ColliderTag, ContactEvent, ContactKind, PhysicsWorld};
use super::world::ObjectStore;

pub fn dispatch(contacts: Vec<ContactEvent>, physics: &PhysicsWorld, objects: &mut ObjectStore, events: &mut Events) {
    for contact in contacts {
        if contact.a.owner == contact.b.owner {
            continue;
        }
        // Ids may have been freed since the step
        let (Some(first), Some(second)) = (objects.get(contact.a.owner), objects.get(contact.b.owner)) else {
            continue;
        };
        let first = (first.kind(), first.profile(physics));
        let second = (second.kind(), second.profile(physics));

        match contact.kind {
            ContactKind::Begin => begin(contact.a, contact.b, first, second, objects),
            ContactKind::Impulse { magnitude } => {
                if magnitude < CRASH_IMPULSE_THRESHOLD {
                    continue;
                }
                if first.0 == ObjectKind::Projectile || second.0 == ObjectKind::Projectile {
                    continue;
                }
                let amount = (magnitude - CRASH_IMPULSE_THRESHOLD) * CRASH_DAMAGE_FACTOR;
                let at = (first.1.position + second.1.position) * 0.5;
                crash(contact.a.owner, amount, at, objects, events);
                crash(contact.b.owner, amount, at, objects, events);
            }
        }
    }
}

type Side = (ObjectKind, ContactProfile);

fn begin(a: ColliderTag, b: ColliderTag, first: Side, second: Side, objects: &mut ObjectStore) {
    // Loot only cares about ship hulls
    match (first.0, second.0) {
        (ObjectKind::Loot, ObjectKind::Ship) => return pick(a.owner, b.owner, objects),
        (ObjectKind::Ship, ObjectKind::Loot) => return pick(b.owner, a.owner, objects),
        (ObjectKind::Loot, _) | (_, ObjectKind::Loot) => return,
        _ => {}
    }

    let agree = objects
        .get(a.owner)
        .map_or(false, |o| o.should_collide(&second.1, b.part))
        && objects
            .get(b.owner)
            .map_or(false, |o| o.should_collide(&first.1, a.part));
    if !agree {
        return;
    }

    if let Some(WorldObject::Projectile(p)) = objects.get_mut(a.owner) {
        p.set_obstacle(b.owner, &second.1);
    }
    if let Some(WorldObject::Projectile(p)) = objects.get_mut(b.owner) {
        p.set_obstacle(a.owner, &first.1);
    }
}

fn pick(loot: ObjectId, ship: ObjectId, objects: &mut ObjectStore) {
    if let Some(WorldObject::Loot(l)) = objects.get_mut(loot) {
        l.pick(ship);
    }
}

fn crash(id: ObjectId, amount: f32, at: Vec2, objects: &mut ObjectStore, events: &mut Events) {
    let Some(object) = objects.get_mut(id) else { return };
    if matches!(object.kind(), ObjectKind::Ship | ObjectKind::Asteroid) {
        object.receive_damage(amount, at, DamageType::Crash, events);
    }
}

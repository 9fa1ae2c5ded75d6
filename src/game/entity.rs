//! Object Identity with Generational Indices
//!
//! Every world object is addressed by an `ObjectId`: a slot index plus a
//! generation counter. When an object is removed its slot can be reused,
//! and the generation increments so stale ids (a projectile's remembered
//! obstacle, the hero's old ship) never resolve to the newcomer.
//!
//! Ids are reserved *before* an object is built. Physics colliders carry
//! their owner's id in user data, so the id must exist when the body is
//! created, long before the object reaches the live set.

use serde::{Deserialize, Serialize};

/// A unique identifier for a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    /// Index into object storage
    index: u32,
    /// Generation counter - increments when slot is reused
    generation: u32,
}

impl ObjectId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Pack into the low 64 bits of a physics user-data word.
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

/// Allocates and tracks object lifetimes.
///
/// Freed slots are reused with an incremented generation.
#[derive(Debug, Default)]
pub struct IdAllocator {
    generations: Vec<u32>,
    /// Free slots available for reuse (LIFO)
    free_indices: Vec<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id. It stays alive until `free` is called.
    pub fn allocate(&mut self) -> ObjectId {
        if let Some(index) = self.free_indices.pop() {
            // Generation was already bumped when the slot was freed
            ObjectId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            ObjectId::new(index, 0)
        }
    }

    /// Free an id, making its slot available for reuse.
    /// Returns true if the id was alive.
    pub fn free(&mut self, id: ObjectId) -> bool {
        if !self.is_alive(id) {
            return false;
        }

        self.generations[id.index as usize] = self.generations[id.index as usize].wrapping_add(1);
        self.free_indices.push(id.index);
        true
    }

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.generations
            .get(id.index as usize)
            .map_or(false, |&gen| gen == id.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_free() {
        let mut ids = IdAllocator::new();

        let a = ids.allocate();
        let b = ids.allocate();
        assert_ne!(a, b);

        assert!(ids.free(a));
        assert!(!ids.is_alive(a));
        assert!(ids.is_alive(b));
        assert!(!ids.free(a), "double free must be rejected");
    }

    #[test]
    fn test_generation_prevents_stale_match() {
        let mut ids = IdAllocator::new();

        let old = ids.allocate();
        ids.free(old);
        let new = ids.allocate();

        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation, old.generation);
        assert!(!ids.is_alive(old));
        assert!(ids.is_alive(new));
    }

    #[test]
    fn test_bits_round_trip() {
        let id = ObjectId::new(7, 3);
        assert_eq!(ObjectId::from_bits(id.to_bits()), id);
    }
}

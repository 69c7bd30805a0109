//! # Entity — Opaque Identifiers
//!
//! An [`Entity`] is just a number. It doesn't "contain" anything. The
//! [`World`](super::world::World) maps entities to their components, and an
//! entity with no components is nothing more than a reserved id.
//!
//! ## Design: A Counter That Never Goes Back
//!
//! Ids come from a plain incrementing counter and are **never recycled**:
//!
//! ```text
//! 1. Create entity #5
//! 2. Store a reference: saved = Entity(5)
//! 3. Destroy entity #5
//! 4. Create a new entity: gets #6, not #5
//! 5. Use `saved`: lookups fail with NotFound instead of hitting #6
//! ```
//!
//! A `u64` counter won't wrap in any realistic session, so stale handles can
//! be detected without a generation field. The one exception is
//! [`World::clear`](super::world::World::clear), which throws away every
//! entity and restarts the counter.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: Index + generation packed into a `u64`, slots are
//!   recycled.
//! - **Here**: No recycling, so no generation. Simpler, at the price of an
//!   ever-growing id space.

use std::fmt;

/// A lightweight handle to an entity in a [`World`](super::world::World).
///
/// Entities are minted by [`World::create_entity`](super::world::World::create_entity).
/// The first entity of a fresh world is `Entity(1)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(pub(crate) u64);

impl Entity {
    /// Returns the raw id.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out entity ids.
///
/// ```text
/// last: 3          ← id of the most recently allocated entity
/// allocate() → 4   ← always last + 1
/// ```
pub(crate) struct EntityAllocator {
    /// Id handed out by the previous `allocate()`. Zero means none yet.
    last: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Allocate the next [`Entity`].
    pub fn allocate(&mut self) -> Entity {
        self.last += 1;
        Entity(self.last)
    }

    /// Start counting from scratch. Only `World::clear` does this.
    pub fn reset(&mut self) {
        self.last = 0;
    }

    /// Number of ids handed out since creation or the last reset.
    #[cfg(any(feature = "diagnostics", test))]
    pub fn total_allocated(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_starts_at_one() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.allocate(), Entity(1));
        assert_eq!(alloc.allocate(), Entity(2));
        assert_eq!(alloc.total_allocated(), 2);
    }

    #[test]
    fn reset_restarts_counter() {
        let mut alloc = EntityAllocator::new();
        alloc.allocate();
        alloc.allocate();
        alloc.reset();
        assert_eq!(alloc.total_allocated(), 0);
        assert_eq!(alloc.allocate(), Entity(1));
    }

    #[test]
    fn formatting() {
        let e = Entity(42);
        assert_eq!(format!("{e:?}"), "Entity(42)");
        assert_eq!(format!("{e}"), "42");
        assert_eq!(e.id(), 42);
    }
}

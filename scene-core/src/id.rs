//! Opaque, globally-unique-per-process identifiers.
//!
//! Unlike `fyrox_core::pool::Handle`, an `Id` is never reused after the
//! entity it names is deleted and garbage-collected: the spec requires that
//! a new id never alias any live or deleted id (§3.1), which rules out a
//! generational-pool handle whose index gets recycled.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

/// Always refers to the world-frame root.
pub const GROUND_ID: Id = Id(0);
/// Refers to nothing.
pub const EMPTY_ID: Id = Id(u64::MAX);

impl Id {
    pub fn is_empty(self) -> bool {
        self == EMPTY_ID
    }

    pub fn is_ground(self) -> bool {
        self == GROUND_ID
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == GROUND_ID {
            write!(f, "Id(ground)")
        } else if *self == EMPTY_ID {
            write!(f, "Id(empty)")
        } else {
            write!(f, "Id({})", self.0)
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-store monotonic issuer. Kept as a field on the owning store rather
/// than a global static so two independent scene graphs (e.g. in tests) mint
/// non-interfering ids and so imports stay reproducible across runs (see
/// Design Notes, "Global singletons").
#[derive(Clone, Debug)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        // 0 is reserved for GROUND_ID.
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next(&mut self) -> Id {
        let id = Id(self.next);
        self.next += 1;
        id
    }
}

//! # Handles
//!
//! Handles are lightweight capability tokens consisting of:
//! - The tag of the heap that issued them
//! - A serial number, unique and increasing within that heap
//! - The size that was requested

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of heap tags. Every heap gets a distinct tag so that a handle
/// issued by one heap never resolves in another.
static NEXT_ARENA_TAG: AtomicU32 = AtomicU32::new(0);

/// Reserves a fresh heap tag.
pub(crate) fn next_arena_tag() -> u32 {
    NEXT_ARENA_TAG.fetch_add(1, Ordering::Relaxed)
}

/// Unique identifier for a handle.
///
/// Two handles of equal size are still distinguishable: the serial number
/// is never reused within a heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId {
    arena: u32,
    serial: u64,
}

impl HandleId {
    #[inline]
    pub(crate) const fn new(arena: u32, serial: u64) -> Self {
        Self { arena, serial }
    }

    /// Returns the tag of the heap that issued this id.
    #[inline]
    #[must_use]
    pub const fn arena(self) -> u32 {
        self.arena
    }

    /// Returns the serial number within the issuing heap.
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.arena, self.serial)
    }
}

/// Handle to a reservation in a [`Heap`](crate::Heap).
///
/// A handle carries no ownership of buffer memory; it is a key into the
/// heap's tables. It stays valid until passed to
/// [`Heap::free`](crate::Heap::free), after which every operation on it
/// fails with [`HeapError::InvalidHandle`](crate::HeapError::InvalidHandle).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    id: HandleId,
    size: usize,
}

impl Handle {
    #[inline]
    pub(crate) const fn new(id: HandleId, size: usize) -> Self {
        Self { id, size }
    }

    /// Returns the handle's identifier.
    #[inline]
    #[must_use]
    pub const fn id(self) -> HandleId {
        self.id
    }

    /// Returns the number of cells that were reserved.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        self.size
    }
}

//! # Memory Management
//!
//! A fixed buffer, allocated once, carved into contiguous reservations.
//!
//! ## Design Philosophy
//!
//! The backing buffer never grows. Instead of a free list:
//! - New reservations are appended after the last live one
//! - Frees only trim the tail of the allocation order
//! - Fragmentation is recovered by compacting toward offset 0

mod handle;
mod heap;
mod range;
mod stats;

pub use handle::{Handle, HandleId};
pub use heap::{Cell, Heap, ZERO_CELL};
pub use range::Range;
pub use stats::HeapStats;

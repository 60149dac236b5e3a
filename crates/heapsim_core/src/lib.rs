//! # HEAPSIM Core
//!
//! A simulated heap: one fixed-capacity buffer of 2-byte cells, carved into
//! contiguous reservations addressed through opaque handles.
//!
//! ## Architecture Rules
//!
//! 1. **Allocated once** - The backing buffer is sized at construction and never resized
//! 2. **No free list** - Fragmentation is recovered by compacting toward the front
//! 3. **Stale handles fail** - Every use of a freed handle is an error, never a silent no-op
//!
//! ## Example
//!
//! ```rust
//! use heapsim_core::{Heap, HeapError};
//!
//! let mut heap = Heap::new(10);
//! let a = heap.allocate(3)?;
//! let h = heap.allocate(3)?;
//! let _ = heap.allocate(3)?;
//! heap.write(h, &"hel".encode_utf16().collect::<Vec<_>>())?;
//!
//! heap.free(a)?;
//! let _ = heap.allocate(3)?; // compacts: `h` moves to offset 0
//! assert_eq!(heap.read(h, 3)?, "hel".encode_utf16().collect::<Vec<_>>());
//! assert_eq!(heap.free(a), Err(HeapError::InvalidHandle(a.id())));
//! # Ok::<(), HeapError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;
pub mod sync;

pub use config::{HeapConfig, DEFAULT_CAPACITY};
pub use error::{HeapError, HeapResult};
pub use memory::{Cell, Handle, HandleId, Heap, HeapStats, Range, ZERO_CELL};
pub use sync::SharedHeap;

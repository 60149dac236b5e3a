//! # Heap Error Types
//!
//! All errors that can occur while operating on a simulated heap.

use thiserror::Error;

use crate::memory::HandleId;

/// Errors that can occur in heap operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    /// Requested more cells than the heap has free in total.
    #[error("out of space: requested {requested} cells, {available} available")]
    OutOfSpace {
        /// Cells requested.
        requested: usize,
        /// Free capacity at the time of the request.
        available: usize,
    },

    /// The handle was freed, never issued, or issued by a different heap.
    #[error("invalid handle: {0}")]
    InvalidHandle(HandleId),

    /// A write payload does not fit in the handle's reservation.
    #[error("capacity exceeded: {len} cells written into a {reserved}-cell reservation")]
    CapacityExceeded {
        /// Length of the payload.
        len: usize,
        /// Size of the reservation.
        reserved: usize,
    },

    /// Zero-cell reservations cannot be represented.
    #[error("zero-sized allocation")]
    ZeroSizedAllocation,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for heap operations.
pub type HeapResult<T> = Result<T, HeapError>;

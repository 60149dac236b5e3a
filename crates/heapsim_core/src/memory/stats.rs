//! # Heap Statistics

/// Point-in-time snapshot of a heap's bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total cells in the backing buffer.
    pub capacity: usize,
    /// Cells available across the heap, contiguous or not.
    pub free: usize,
    /// Cells held by live reservations.
    pub used: usize,
    /// Live handles.
    pub live_handles: usize,
    /// Freed slots still sitting inside the live sequence.
    pub holes: usize,
    /// Contiguous cells after the last live reservation.
    pub tail_free: usize,
    /// Compactions performed since creation.
    pub compactions: u64,
    /// Successful allocations since creation.
    pub allocations: u64,
    /// Successful frees since creation.
    pub frees: u64,
}

impl HeapStats {
    /// Free cells that can only be reached by compacting.
    #[inline]
    #[must_use]
    pub const fn fragmented(&self) -> usize {
        self.free - self.tail_free
    }
}

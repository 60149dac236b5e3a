//! # Compacting Heap
//!
//! A fixed-capacity cell buffer that hands out contiguous reservations
//! through [`Handle`]s.
//!
//! ## Placement
//!
//! ```text
//! live sequence:  [ a ][hole][ c ][ d ]
//! buffer:         |aaa|....|cc|dddd|________|
//!                                  ^ next placement
//! ```
//!
//! New reservations always start right after the last live one. If that
//! would run past the end of the buffer while enough free cells exist
//! elsewhere, the heap compacts first: every live reservation slides toward
//! offset 0 in sequence order and the holes collapse into one free tail.
//! There is no free list; compaction is the only way interior holes are
//! reused.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use super::handle::{next_arena_tag, Handle, HandleId};
use super::range::Range;
use super::stats::HeapStats;
use crate::config::{HeapConfig, DEFAULT_CAPACITY};
use crate::error::{HeapError, HeapResult};

/// One unit of heap storage (a 2-byte code unit).
pub type Cell = u16;

/// Value of every cell that has never been written or has been released.
pub const ZERO_CELL: Cell = 0;

/// A simulated heap with compaction.
///
/// # Thread Safety
///
/// This heap is NOT thread-safe and does no locking. Use one heap per
/// thread or wrap it in a [`SharedHeap`](crate::SharedHeap).
///
/// # Example
///
/// ```rust
/// use heapsim_core::Heap;
///
/// let mut heap = Heap::new(10);
/// let h = heap.allocate(3)?;
/// heap.write(h, &[1, 2, 3])?;
/// assert_eq!(heap.read(h, 3)?, vec![1, 2, 3]);
/// heap.free(h)?;
/// assert!(heap.read(h, 3).is_err());
/// # Ok::<(), heapsim_core::HeapError>(())
/// ```
pub struct Heap {
    /// The backing storage. Never resized.
    buffer: Box<[Cell]>,
    /// Handles in allocation order. `None` marks a freed slot.
    live: Vec<Option<Handle>>,
    /// Where each live handle currently sits.
    ranges: HashMap<HandleId, Range>,
    /// Index of each live handle in `live`.
    positions: HashMap<HandleId, usize>,
    /// Cells available across the whole buffer.
    free: usize,
    /// Tag stamped into every handle this heap issues.
    arena: u32,
    next_serial: u64,
    compactions: u64,
    allocations: u64,
    frees: u64,
}

impl Heap {
    /// Creates a heap of `capacity` cells, all set to [`ZERO_CELL`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![ZERO_CELL; capacity].into_boxed_slice(),
            live: Vec::new(),
            ranges: HashMap::new(),
            positions: HashMap::new(),
            free: capacity,
            arena: next_arena_tag(),
            next_serial: 0,
            compactions: 0,
            allocations: 0,
            frees: 0,
        }
    }

    /// Creates a heap from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidConfig`] if the configuration is invalid.
    pub fn from_config(config: &HeapConfig) -> HeapResult<Self> {
        config.validate()?;
        Ok(Self::new(config.capacity))
    }

    /// Returns the total capacity in cells.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the cells available, contiguous or not.
    #[inline]
    #[must_use]
    pub const fn free_capacity(&self) -> usize {
        self.free
    }

    /// Returns the cells held by live reservations.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.capacity() - self.free
    }

    /// Returns the number of live handles.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.ranges.len()
    }

    /// Whether `handle` currently refers to a reservation in this heap.
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: Handle) -> bool {
        self.ranges.contains_key(&handle.id())
    }

    /// Returns where `handle` currently sits in the buffer.
    ///
    /// The range can change whenever an allocation triggers compaction.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle is not live.
    pub fn range_of(&self, handle: Handle) -> HeapResult<Range> {
        self.resolve(handle)
    }

    /// Iterates over live handles in allocation order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.live.iter().flatten().copied()
    }

    /// Reserves `size` contiguous cells.
    ///
    /// Space is checked against the total free capacity. If the free cells
    /// are not contiguous at the end of the buffer the heap compacts before
    /// placing the reservation, which moves existing reservations.
    ///
    /// # Errors
    ///
    /// - [`HeapError::ZeroSizedAllocation`] if `size` is zero.
    /// - [`HeapError::OutOfSpace`] if `size` exceeds the free capacity.
    pub fn allocate(&mut self, size: usize) -> HeapResult<Handle> {
        if size == 0 {
            return Err(HeapError::ZeroSizedAllocation);
        }
        if size > self.free {
            return Err(HeapError::OutOfSpace {
                requested: size,
                available: self.free,
            });
        }

        let mut offset = self.next_offset();
        if offset + size > self.capacity() {
            self.compact();
            offset = self.next_offset();
        }

        let handle = Handle::new(HandleId::new(self.arena, self.next_serial), size);
        self.next_serial += 1;

        self.ranges.insert(handle.id(), Range::with_len(offset, size));
        self.live.push(Some(handle));
        self.positions.insert(handle.id(), self.live.len() - 1);
        self.free -= size;
        self.allocations += 1;

        trace!(handle = %handle.id(), offset, size, "allocated");
        Ok(handle)
    }

    /// Releases the reservation behind `handle`.
    ///
    /// The handle is dead afterwards. Its cells are reset to [`ZERO_CELL`].
    /// Only freed slots at the end of the allocation order are dropped from
    /// the live sequence; interior slots stay as holes until the next
    /// compaction, so no other handle's position has to be rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle was already freed
    /// or was not issued by this heap. The heap is left unchanged.
    pub fn free(&mut self, handle: Handle) -> HeapResult<()> {
        let id = handle.id();
        let range = self.resolve(handle)?;
        let position = self
            .positions
            .remove(&id)
            .ok_or(HeapError::InvalidHandle(id))?;

        self.ranges.remove(&id);
        self.live[position] = None;
        while matches!(self.live.last(), Some(None)) {
            self.live.pop();
        }

        self.buffer[range.span()].fill(ZERO_CELL);
        self.free += range.len();
        self.frees += 1;

        trace!(handle = %id, size = range.len(), "freed");
        Ok(())
    }

    /// Writes `data` at the start of the reservation. Last write wins.
    ///
    /// Cells past `data.len()` keep their previous contents.
    ///
    /// # Errors
    ///
    /// - [`HeapError::InvalidHandle`] if the handle is not live.
    /// - [`HeapError::CapacityExceeded`] if `data` is longer than the
    ///   reservation.
    pub fn write(&mut self, handle: Handle, data: &[Cell]) -> HeapResult<()> {
        let range = self.resolve(handle)?;
        if data.len() > range.len() {
            return Err(HeapError::CapacityExceeded {
                len: data.len(),
                reserved: range.len(),
            });
        }

        let begin = range.begin();
        self.buffer[begin..begin + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads `size` cells from the start of the reservation.
    ///
    /// The result always has length `size`. When `size` exceeds the
    /// reservation, only the reserved cells are copied and the rest of the
    /// result is [`ZERO_CELL`]. Unwritten cells read as [`ZERO_CELL`].
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle is not live.
    pub fn read(&self, handle: Handle, size: usize) -> HeapResult<Vec<Cell>> {
        let range = self.resolve(handle)?;
        let mut out = vec![ZERO_CELL; size];
        self.copy_out(range, &mut out);
        Ok(out)
    }

    /// Copies the reservation's leading cells into `out` without allocating.
    ///
    /// Copies `min(out.len(), reservation size)` cells and returns that
    /// count. Cells of `out` past the count are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle is not live.
    pub fn read_into(&self, handle: Handle, out: &mut [Cell]) -> HeapResult<usize> {
        let range = self.resolve(handle)?;
        Ok(self.copy_out(range, out))
    }

    /// Returns a snapshot of the heap's bookkeeping.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            capacity: self.capacity(),
            free: self.free,
            used: self.used(),
            live_handles: self.ranges.len(),
            holes: self.live.len() - self.ranges.len(),
            tail_free: self.capacity() - self.next_offset(),
            compactions: self.compactions,
            allocations: self.allocations,
            frees: self.frees,
        }
    }

    fn resolve(&self, handle: Handle) -> HeapResult<Range> {
        self.ranges
            .get(&handle.id())
            .copied()
            .ok_or(HeapError::InvalidHandle(handle.id()))
    }

    fn copy_out(&self, range: Range, out: &mut [Cell]) -> usize {
        let count = out.len().min(range.len());
        let begin = range.begin();
        out[..count].copy_from_slice(&self.buffer[begin..begin + count]);
        count
    }

    /// Offset right after the last live reservation, or 0 if none.
    ///
    /// Trailing holes are always trimmed, so the last slot is live whenever
    /// the sequence is non-empty.
    fn next_offset(&self) -> usize {
        self.live
            .last()
            .copied()
            .flatten()
            .and_then(|handle| self.ranges.get(&handle.id()))
            .map_or(0, |range| range.end_exclusive())
    }

    /// Slides every live reservation toward offset 0 in sequence order.
    ///
    /// Ranges grow along the sequence, so each destination starts at or
    /// before its source and moves never clobber data still to be moved.
    fn compact(&mut self) {
        let holes = self.live.len() - self.ranges.len();
        self.live.retain(Option::is_some);
        self.positions.clear();

        let mut cursor = 0;
        let mut moved = 0usize;
        for (position, handle) in self.live.iter().flatten().enumerate() {
            let id = handle.id();
            let old = self.ranges[&id];
            debug_assert!(cursor <= old.begin());
            let new = Range::with_len(cursor, old.len());

            if old.begin() != cursor {
                self.buffer.copy_within(old.span(), cursor);
                let vacated = old.begin().max(new.end_exclusive())..old.end_exclusive();
                self.buffer[vacated].fill(ZERO_CELL);
                self.ranges.insert(id, new);
                moved += 1;
            }

            self.positions.insert(id, position);
            cursor = new.end_exclusive();
        }

        self.compactions += 1;
        debug!(
            moved,
            holes,
            live = self.live.len(),
            tail_free = self.capacity() - cursor,
            "compacted heap"
        );
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("arena", &self.arena)
            .field("capacity", &self.capacity())
            .field("free", &self.free)
            .field("live", &self.ranges.len())
            .field("compactions", &self.compactions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(s: &str) -> Vec<Cell> {
        s.encode_utf16().collect()
    }

    /// Checks every bookkeeping invariant against the raw tables.
    fn assert_consistent(heap: &Heap) {
        let live: Vec<Handle> = heap.handles().collect();
        assert_eq!(live.len(), heap.ranges.len());
        assert_eq!(heap.positions.len(), heap.ranges.len());
        assert!(!matches!(heap.live.last(), Some(None)), "trailing hole");

        let used: usize = heap.ranges.values().map(|r| r.len()).sum();
        assert_eq!(used + heap.free, heap.capacity());

        for (position, slot) in heap.live.iter().enumerate() {
            if let Some(handle) = slot {
                assert_eq!(heap.positions[&handle.id()], position);
                assert_eq!(heap.ranges[&handle.id()].len(), handle.size());
            }
        }

        for pair in live.windows(2) {
            let a = heap.ranges[&pair[0].id()];
            let b = heap.ranges[&pair[1].id()];
            assert!(a.end() < b.begin(), "ranges out of order or overlapping");
        }

        for (offset, cell) in heap.buffer.iter().enumerate() {
            let covered = heap.ranges.values().any(|r| r.span().contains(&offset));
            if !covered {
                assert_eq!(*cell, ZERO_CELL, "stale cell at {offset}");
            }
        }
    }

    #[test]
    fn test_allocate_places_front_to_back() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(3).unwrap();
        let b = heap.allocate(2).unwrap();
        assert_eq!(heap.range_of(a).unwrap(), Range::with_len(0, 3));
        assert_eq!(heap.range_of(b).unwrap(), Range::with_len(3, 2));
        assert_eq!(heap.free_capacity(), 5);
        assert_consistent(&heap);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut heap = Heap::new(4);
        assert_eq!(heap.allocate(0), Err(HeapError::ZeroSizedAllocation));
        assert_eq!(heap.free_capacity(), 4);
    }

    #[test]
    fn test_out_of_space_reports_available() {
        let mut heap = Heap::new(10);
        let _ = heap.allocate(8).unwrap();
        assert_eq!(
            heap.allocate(3),
            Err(HeapError::OutOfSpace {
                requested: 3,
                available: 2
            })
        );
        assert_consistent(&heap);
    }

    #[test]
    fn test_free_trims_only_trailing_holes() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(2).unwrap();
        let b = heap.allocate(2).unwrap();
        let c = heap.allocate(2).unwrap();

        heap.free(b).unwrap();
        assert_eq!(heap.live.len(), 3);
        assert_eq!(heap.stats().holes, 1);

        heap.free(c).unwrap();
        // c and the hole left by b are both trailing now
        assert_eq!(heap.live.len(), 1);
        assert_eq!(heap.stats().holes, 0);
        assert_eq!(heap.positions[&a.id()], 0);
        assert_consistent(&heap);
    }

    #[test]
    fn test_interior_free_does_not_move_placement() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(3).unwrap();
        let _b = heap.allocate(3).unwrap();
        heap.free(a).unwrap();

        let c = heap.allocate(2).unwrap();
        assert_eq!(heap.range_of(c).unwrap().begin(), 6);
        assert_eq!(heap.stats().compactions, 0);
        assert_consistent(&heap);
    }

    #[test]
    fn test_compaction_relocates_and_preserves_content() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(3).unwrap();
        let h = heap.allocate(3).unwrap();
        let _c = heap.allocate(3).unwrap();
        heap.write(h, &cells("hel")).unwrap();
        heap.free(a).unwrap();

        let d = heap.allocate(3).unwrap();
        assert_eq!(heap.stats().compactions, 1);
        assert_eq!(heap.range_of(h).unwrap(), Range::with_len(0, 3));
        assert_eq!(heap.range_of(d).unwrap(), Range::with_len(6, 3));
        assert_eq!(heap.read(h, 3).unwrap(), cells("hel"));
        assert_consistent(&heap);
    }

    #[test]
    fn test_compaction_zeroes_vacated_cells() {
        let mut heap = Heap::new(6);
        let a = heap.allocate(1).unwrap();
        let b = heap.allocate(4).unwrap();
        heap.write(b, &[7, 7, 7, 7]).unwrap();
        heap.free(a).unwrap();

        // 1 tail cell + 1 hole: needs compaction
        let _c = heap.allocate(2).unwrap();
        assert_eq!(&heap.buffer[..4], &[7, 7, 7, 7]);
        assert_eq!(heap.read(b, 4).unwrap(), vec![7, 7, 7, 7]);
        assert_consistent(&heap);
    }

    #[test]
    fn test_compaction_rebuilds_positions() {
        let mut heap = Heap::new(8);
        let a = heap.allocate(2).unwrap();
        let b = heap.allocate(2).unwrap();
        let c = heap.allocate(2).unwrap();
        let d = heap.allocate(2).unwrap();
        heap.free(a).unwrap();
        heap.free(c).unwrap();

        let e = heap.allocate(4).unwrap();
        assert_eq!(heap.live.len(), 3);
        assert_eq!(heap.positions[&b.id()], 0);
        assert_eq!(heap.positions[&d.id()], 1);
        assert_eq!(heap.positions[&e.id()], 2);
        assert_eq!(heap.stats().free, 0);
        assert_consistent(&heap);
    }

    #[test]
    fn test_free_clears_cells() {
        let mut heap = Heap::new(4);
        let a = heap.allocate(4).unwrap();
        heap.write(a, &[1, 2, 3, 4]).unwrap();
        heap.free(a).unwrap();

        let b = heap.allocate(4).unwrap();
        assert_eq!(heap.read(b, 4).unwrap(), vec![ZERO_CELL; 4]);
    }

    #[test]
    fn test_double_free_rejected_without_side_effects() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(3).unwrap();
        heap.free(a).unwrap();

        let before = heap.stats();
        assert_eq!(heap.free(a), Err(HeapError::InvalidHandle(a.id())));
        assert_eq!(heap.stats(), before);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut first = Heap::new(10);
        let mut second = Heap::new(10);
        let h = first.allocate(3).unwrap();
        let _ = second.allocate(3).unwrap();

        assert!(!second.is_live(h));
        assert_eq!(second.free(h), Err(HeapError::InvalidHandle(h.id())));
        assert_eq!(second.read(h, 1), Err(HeapError::InvalidHandle(h.id())));
    }

    #[test]
    fn test_write_too_large() {
        let mut heap = Heap::new(10);
        let h = heap.allocate(2).unwrap();
        assert_eq!(
            heap.write(h, &[1, 2, 3]),
            Err(HeapError::CapacityExceeded {
                len: 3,
                reserved: 2
            })
        );
        assert_eq!(heap.read(h, 2).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_partial_write_keeps_tail() {
        let mut heap = Heap::new(10);
        let h = heap.allocate(4).unwrap();
        heap.write(h, &[1, 2, 3, 4]).unwrap();
        heap.write(h, &[9]).unwrap();
        assert_eq!(heap.read(h, 4).unwrap(), vec![9, 2, 3, 4]);
    }

    #[test]
    fn test_read_into_leaves_excess_untouched() {
        let mut heap = Heap::new(10);
        let h = heap.allocate(2).unwrap();
        heap.write(h, &[5, 6]).unwrap();

        let mut out = [42; 4];
        assert_eq!(heap.read_into(h, &mut out).unwrap(), 2);
        assert_eq!(out, [5, 6, 42, 42]);
    }

    #[test]
    fn test_read_zero_cells() {
        let mut heap = Heap::new(4);
        let h = heap.allocate(2).unwrap();
        assert!(heap.read(h, 0).unwrap().is_empty());
    }

    #[test]
    fn test_stats_tail_and_fragmentation() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(3).unwrap();
        let _b = heap.allocate(3).unwrap();
        heap.free(a).unwrap();

        let stats = heap.stats();
        assert_eq!(stats.free, 7);
        assert_eq!(stats.used, 3);
        assert_eq!(stats.tail_free, 4);
        assert_eq!(stats.fragmented(), 3);
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.frees, 1);
    }

    #[test]
    fn test_handles_in_allocation_order() {
        let mut heap = Heap::new(10);
        let a = heap.allocate(1).unwrap();
        let b = heap.allocate(1).unwrap();
        let c = heap.allocate(1).unwrap();
        heap.free(b).unwrap();
        assert_eq!(heap.handles().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_from_config() {
        let heap = Heap::from_config(&HeapConfig::with_capacity(32)).unwrap();
        assert_eq!(heap.capacity(), 32);
        assert!(Heap::from_config(&HeapConfig::with_capacity(0)).is_err());
    }
}

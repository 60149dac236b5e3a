//! # Ranges
//!
//! Inclusive offset intervals describing where a reservation lives.

/// `[begin, end]` inclusive cell offsets into a heap's backing buffer.
///
/// A range always covers at least one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    begin: usize,
    end: usize,
}

impl Range {
    /// Creates a range of `len` cells starting at `begin`.
    ///
    /// `len` must be non-zero.
    #[inline]
    pub(crate) fn with_len(begin: usize, len: usize) -> Self {
        debug_assert!(len > 0, "ranges cover at least one cell");
        Self {
            begin,
            end: begin + len - 1,
        }
    }

    /// First offset covered.
    #[inline]
    #[must_use]
    pub const fn begin(self) -> usize {
        self.begin
    }

    /// Last offset covered (inclusive).
    #[inline]
    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of cells covered.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.begin + 1
    }

    /// Always false; present for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Offset one past the last covered cell.
    #[inline]
    #[must_use]
    pub const fn end_exclusive(self) -> usize {
        self.end + 1
    }

    /// The covered offsets as a half-open slice range.
    #[inline]
    #[must_use]
    pub const fn span(self) -> std::ops::Range<usize> {
        self.begin..self.end + 1
    }

    /// Whether the two ranges share any offset.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.begin <= other.end && other.begin <= self.end
    }
}

//! # Shared Access
//!
//! [`Heap`] does no locking of its own. When several threads need the same
//! heap, they serialize through a [`SharedHeap`]:
//!
//! ```text
//! Thread 1 ──┐
//!            ├──► Mutex<Heap> ──► allocate / free / write / read
//! Thread 2 ──┘
//! ```
//!
//! Each call takes the lock for one operation. Use [`SharedHeap::lock`] to
//! hold it across several operations (for example allocate then write).

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::HeapResult;
use crate::memory::{Cell, Handle, Heap, HeapStats};

/// Cloneable, thread-safe wrapper around a [`Heap`].
///
/// # Example
///
/// ```rust
/// use heapsim_core::{Heap, SharedHeap};
///
/// let shared = SharedHeap::new(Heap::new(64));
/// let worker = shared.clone();
/// let h = std::thread::spawn(move || worker.allocate(8)).join().unwrap()?;
/// assert!(shared.lock().is_live(h));
/// # Ok::<(), heapsim_core::HeapError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SharedHeap {
    inner: Arc<Mutex<Heap>>,
}

impl SharedHeap {
    /// Wraps a heap for shared use.
    #[must_use]
    pub fn new(heap: Heap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(heap)),
        }
    }

    /// Locks the heap for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, Heap> {
        self.inner.lock()
    }

    /// See [`Heap::allocate`].
    ///
    /// # Errors
    ///
    /// Same as [`Heap::allocate`].
    pub fn allocate(&self, size: usize) -> HeapResult<Handle> {
        self.inner.lock().allocate(size)
    }

    /// See [`Heap::free`].
    ///
    /// # Errors
    ///
    /// Same as [`Heap::free`].
    pub fn free(&self, handle: Handle) -> HeapResult<()> {
        self.inner.lock().free(handle)
    }

    /// See [`Heap::write`].
    ///
    /// # Errors
    ///
    /// Same as [`Heap::write`].
    pub fn write(&self, handle: Handle, data: &[Cell]) -> HeapResult<()> {
        self.inner.lock().write(handle, data)
    }

    /// See [`Heap::read`].
    ///
    /// # Errors
    ///
    /// Same as [`Heap::read`].
    pub fn read(&self, handle: Handle, size: usize) -> HeapResult<Vec<Cell>> {
        self.inner.lock().read(handle, size)
    }

    /// See [`Heap::stats`].
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        self.inner.lock().stats()
    }

    /// Unwraps the heap if this is the last reference.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if other clones are still alive.
    pub fn try_unwrap(self) -> Result<Heap, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Heap> for SharedHeap {
    fn from(heap: Heap) -> Self {
        Self::new(heap)
    }
}

//! # N-Sided Buffered Store
//!
//! Lock-per-side storage for data produced by the simulation and consumed
//! by the render step one or two ticks later.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────────────────┐
//!                 │            BufferedStore<T>           │
//!                 │                                       │
//!                 │  ┌────────┐  ┌────────┐  ┌────────┐   │
//!                 │  │ side 0 │  │ side 1 │  │ side 2 │   │
//!                 │  │ RwLock │  │ RwLock │  │ RwLock │   │
//!                 │  └────────┘  └────────┘  └────────┘   │
//!                 └───────────────────────────────────────┘
//!                        ▲                    │
//!            write_side(cursor.write)   read_side(cursor.read)
//!                        │                    ▼
//!                 ┌──────────────┐     ┌──────────────┐
//!                 │  Simulation  │     │    Render    │
//!                 └──────────────┘     └──────────────┘
//! ```
//!
//! Offsets are identical on every side: element `i` of side 0 and element
//! `i` of side 1 belong to the same owner.

use std::ops::Range;

use bytemuck::Pod;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::side::BufferMode;

/// Fixed-size storage replicated over 1, 2 or 3 sides.
///
/// ## Usage
///
/// ```rust
/// use trailfx_core::{BufferMode, BufferedStore, SideCursor};
///
/// let store: BufferedStore<u32> = BufferedStore::new(BufferMode::Double, 4);
/// let mut cursor = SideCursor::new(BufferMode::Double);
///
/// cursor.swap_side();
/// store.write_side(cursor.write_side())[0] = 7;
/// cursor.close_tick();
///
/// cursor.swap_side();
/// assert_eq!(store.read_side(cursor.read_side())[0], 7);
/// ```
pub struct BufferedStore<T> {
    /// One lock per side.
    sides: Box<[RwLock<Box<[T]>>]>,
    /// Elements per side.
    len: usize,
    /// Buffering policy.
    mode: BufferMode,
}

impl<T: Pod> BufferedStore<T> {
    /// Creates a zero-filled store of `len` elements per side.
    ///
    /// # Note
    /// This allocates `len * side_count` elements. Call once during setup.
    #[must_use]
    pub fn new(mode: BufferMode, len: usize) -> Self {
        let sides: Vec<RwLock<Box<[T]>>> = (0..mode.side_count())
            .map(|_| RwLock::new(vec![T::zeroed(); len].into_boxed_slice()))
            .collect();

        Self {
            sides: sides.into_boxed_slice(),
            len,
            mode,
        }
    }

    /// Elements per side.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the store has no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffering policy.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Number of sides.
    #[inline]
    #[must_use]
    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    /// Total elements over every side.
    #[inline]
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.len * self.sides.len()
    }

    #[inline]
    fn side_lock(&self, side: usize) -> &RwLock<Box<[T]>> {
        debug_assert!(side < self.sides.len(), "Side {side} out of range");
        &self.sides[side % self.sides.len()]
    }

    /// Exclusive access to one side (simulation phase).
    #[must_use]
    pub fn write_side(&self, side: usize) -> MappedRwLockWriteGuard<'_, [T]> {
        RwLockWriteGuard::map(self.side_lock(side).write(), |data| &mut **data)
    }

    /// Shared access to one side (render phase).
    #[must_use]
    pub fn read_side(&self, side: usize) -> MappedRwLockReadGuard<'_, [T]> {
        RwLockReadGuard::map(self.side_lock(side).read(), |data| &**data)
    }

    /// Shared access without waiting. `None` means the writer holds the side,
    /// which only happens when the swap protocol is broken or in single mode.
    #[must_use]
    pub fn try_read_side(&self, side: usize) -> Option<MappedRwLockReadGuard<'_, [T]>> {
        self.side_lock(side)
            .try_read()
            .map(|guard| RwLockReadGuard::map(guard, |data| &**data))
    }

    /// Copies `data` into `side` starting at `offset`.
    ///
    /// Returns the number of elements written; writes past the end are
    /// clamped.
    pub fn write(&self, side: usize, offset: usize, data: &[T]) -> usize {
        let mut dst = self.write_side(side);
        let start = offset.min(dst.len());
        let count = data.len().min(dst.len() - start);
        dst[start..start + count].copy_from_slice(&data[..count]);
        count
    }

    /// Appends the raw bytes of `range` on `side` to `out` for GPU upload.
    ///
    /// The range is clamped to the side length.
    pub fn copy_bytes(&self, side: usize, range: Range<usize>, out: &mut Vec<u8>) {
        let src = self.read_side(side);
        let end = range.end.min(src.len());
        let start = range.start.min(end);
        out.extend_from_slice(bytemuck::cast_slice(&src[start..end]));
    }
}

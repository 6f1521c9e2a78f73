//! # Slot Pool
//!
//! Fixed-size slot allocator for records that are reused rather than
//! constructed, such as ribbon instances with pre-allocated history.

/// A slot that can be returned to its pool.
///
/// `recycle` is called on release and must clear per-use state while keeping
/// any owned memory (history rings stay allocated).
pub trait Recycle {
    /// Clears per-use state.
    fn recycle(&mut self);
}

/// Handle to an occupied slot in a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    /// Index into the pool.
    index: u32,
}

impl PoolHandle {
    /// Handle for slot `index`; callers guarantee it fits a `u32`.
    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    const fn from_slot(index: usize) -> Self {
        Self { index: index as u32 }
    }

    /// Slot index this handle refers to.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

/// Bits per occupancy word.
const WORD_BITS: usize = 64;

/// A pool of pre-built slots with round-robin reuse.
///
/// Every slot is constructed up front. `acquire` scans forward from the slot
/// after the last one it handed out, wrapping at the end, so consecutive
/// acquires spread over the whole pool instead of hammering the most
/// recently freed slot.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It is owned by the simulation phase.
///
/// # Example
///
/// ```rust
/// use trailfx_core::{Recycle, SlotPool};
///
/// #[derive(Default)]
/// struct Spark { heat: f32 }
/// impl Recycle for Spark {
///     fn recycle(&mut self) { self.heat = 0.0; }
/// }
///
/// let mut pool = SlotPool::new(2, |_| Spark::default());
/// let a = pool.acquire().unwrap();
/// let b = pool.acquire().unwrap();
/// assert!(pool.acquire().is_none()); // exhausted, not an error
/// pool.release(a);
/// pool.release(b);
/// ```
pub struct SlotPool<T> {
    /// The slot storage.
    slots: Box<[T]>,
    /// Occupancy bitmap, one bit per slot.
    occupancy: Box<[u64]>,
    /// Index of the last slot handed out.
    cursor: Option<usize>,
    /// Number of occupied slots.
    used_count: usize,
}

impl<T: Recycle> SlotPool<T> {
    /// Creates a pool of `capacity` slots built by `init`.
    ///
    /// All memory is pre-allocated upfront.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or does not fit a `u32` index.
    #[must_use]
    pub fn new(capacity: usize, init: impl FnMut(usize) -> T) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity must fit a u32 slot index"
        );

        let slots: Vec<T> = (0..capacity).map(init).collect();
        let words = capacity.div_ceil(WORD_BITS);

        Self {
            slots: slots.into_boxed_slice(),
            occupancy: vec![0u64; words].into_boxed_slice(),
            cursor: None,
            used_count: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn used_count(&self) -> usize {
        self.used_count
    }

    /// Index of the last slot handed out, `None` after a reset.
    #[inline]
    #[must_use]
    pub const fn last_assigned(&self) -> Option<usize> {
        self.cursor
    }

    /// Whether slot `index` is occupied.
    #[inline]
    #[must_use]
    pub fn is_used(&self, index: usize) -> bool {
        index < self.capacity()
            && self.occupancy[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    #[inline]
    fn set_used(&mut self, index: usize, used: bool) {
        let bit = 1u64 << (index % WORD_BITS);
        if used {
            self.occupancy[index / WORD_BITS] |= bit;
        } else {
            self.occupancy[index / WORD_BITS] &= !bit;
        }
    }

    /// Occupies the next free slot in round-robin order.
    ///
    /// This is a **zero heap allocation** operation.
    ///
    /// # Returns
    ///
    /// A handle to the slot, or `None` if the pool is exhausted. Exhaustion
    /// is a normal capacity limit, not an error.
    pub fn acquire(&mut self) -> Option<PoolHandle> {
        if self.used_count == self.capacity() {
            return None;
        }

        let cap = self.capacity();
        let start = self.cursor.map_or(0, |c| (c + 1) % cap);
        let index = (0..cap)
            .map(|offset| (start + offset) % cap)
            .find(|&i| !self.is_used(i))?;

        self.set_used(index, true);
        self.used_count += 1;
        self.cursor = Some(index);

        Some(PoolHandle::from_slot(index))
    }

    /// Returns a slot to the pool and recycles it.
    ///
    /// # Returns
    ///
    /// `false` if the slot was already free. Double release is a caller bug
    /// and asserts in debug builds.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let index = handle.index();
        let occupied = self.is_used(index);
        debug_assert!(occupied, "Double release of pool slot {index}");
        if !occupied {
            return false;
        }

        self.slots[index].recycle();
        self.set_used(index, false);
        self.used_count -= 1;
        true
    }

    /// Gets an occupied slot.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if self.is_used(handle.index()) {
            self.slots.get(handle.index())
        } else {
            None
        }
    }

    /// Gets an occupied slot mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.is_used(handle.index()) {
            self.slots.get_mut(handle.index())
        } else {
            None
        }
    }

    /// Returns every slot to the pool and resets the round-robin cursor.
    ///
    /// This is a **zero heap allocation** operation - slots are recycled,
    /// not rebuilt.
    pub fn reset(&mut self) {
        for index in 0..self.capacity() {
            if self.is_used(index) {
                self.slots[index].recycle();
            }
        }
        self.occupancy.fill(0);
        self.cursor = None;
        self.used_count = 0;
    }

    /// Iterates over occupied slots.
    pub fn iter_used(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| self.is_used(index).then_some((PoolHandle::from_slot(index), slot)))
    }
}

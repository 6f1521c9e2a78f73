//! # History Ring
//!
//! Fixed-capacity circular buffer holding the most recent samples of a
//! ribbon, oldest first.
//!
//! ```text
//!   physical slots:  [ s4 | s5 | s2 | s3 ]      capacity = 4
//!                          ^head      ^tail      len = 4
//!
//!   logical order:   s2 -> s3 -> s4 -> s5        (oldest -> newest)
//! ```
//!
//! The ring has a physical `capacity`, fixed when it is built, and an active
//! `limit` that can be lowered per use. Once `len == limit`, every push
//! overwrites the oldest sample.

/// A fixed-capacity FIFO-overwrite ring.
///
/// # Example
///
/// ```rust
/// use trailfx_core::HistoryRing;
///
/// let mut ring: HistoryRing<u32> = HistoryRing::new(3);
/// for i in 1..=5 {
///     ring.push(i);
/// }
/// assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryRing<T> {
    /// Backing arena, allocated once.
    slots: Box<[T]>,
    /// Physical index of the newest sample.
    head: usize,
    /// Number of live samples.
    len: usize,
    /// Active window, `1..=capacity`.
    limit: usize,
}

impl<T: Copy + Default> HistoryRing<T> {
    /// Creates a ring with `capacity` pre-allocated slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring capacity must be greater than zero");

        Self {
            slots: vec![T::default(); capacity].into_boxed_slice(),
            head: capacity - 1,
            len: 0,
            limit: capacity,
        }
    }

    /// Returns the physical capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the active window.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Sets the active window and empties the ring.
    ///
    /// The limit is clamped to `1..=capacity`.
    pub fn reset_with_limit(&mut self, limit: usize) {
        debug_assert!(
            (1..=self.capacity()).contains(&limit),
            "Ring limit {limit} outside 1..={}",
            self.capacity()
        );
        self.limit = limit.clamp(1, self.capacity());
        self.clear();
    }

    /// Number of live samples.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the ring holds no samples.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the next push will overwrite the oldest sample.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len >= self.limit
    }

    /// Empties the ring. Slot memory is kept.
    pub fn clear(&mut self) {
        self.head = self.capacity() - 1;
        self.len = 0;
    }

    /// Physical index of the oldest sample.
    #[inline]
    fn tail_index(&self) -> usize {
        let cap = self.capacity();
        (self.head + cap + 1 - self.len) % cap
    }

    /// Pushes a sample as the newest entry.
    ///
    /// Returns the evicted oldest sample when the ring was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let cap = self.capacity();
        let evicted = if self.is_full() {
            let tail = self.tail_index();
            let old = self.slots[tail];
            self.len -= 1;
            Some(old)
        } else {
            None
        };

        self.head = (self.head + 1) % cap;
        self.slots[self.head] = value;
        self.len += 1;

        evicted
    }

    /// Removes and returns the oldest sample.
    pub fn pop_oldest(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.tail_index()];
        self.len -= 1;
        Some(value)
    }

    /// The newest sample.
    #[inline]
    #[must_use]
    pub fn newest(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(&self.slots[self.head])
        }
    }

    /// The oldest sample.
    #[inline]
    #[must_use]
    pub fn oldest(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(&self.slots[self.tail_index()])
        }
    }

    /// Sample at logical position `index`, `0` being the oldest.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let cap = self.capacity();
        Some(&self.slots[(self.tail_index() + index) % cap])
    }

    /// Mutable sample at logical position `index`, `0` being the oldest.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let cap = self.capacity();
        let physical = (self.tail_index() + index) % cap;
        Some(&mut self.slots[physical])
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        let tail = self.tail_index();
        let cap = self.capacity();
        (0..self.len).map(move |i| &self.slots[(tail + i) % cap])
    }
}

//! Ribbon engine statistics.

/// Counters of the ribbon engine.
///
/// `active` and `delayed` are a snapshot; every other field counts since
/// system start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripeStats {
    /// Ribbons owned by a live particle.
    pub active: usize,
    /// Ribbons draining after their particle died.
    pub delayed: usize,
    /// Ribbons created.
    pub created: u64,
    /// Ribbons returned to the pool.
    pub released: u64,
    /// Creates refused because every pool slot was in use.
    pub pool_exhausted: u64,
    /// Creates refused because the emitter hit its ribbon budget.
    pub emitter_budget_exhausted: u64,
    /// Creates refused because the emitter's region could not be reserved.
    pub region_failed: u64,
    /// Vertices written by mesh rebuilds.
    pub vertices_written: u64,
}

impl StripeStats {
    /// Ribbons holding a pool slot.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.active + self.delayed
    }

    /// Particles that got no ribbon.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.pool_exhausted + self.emitter_budget_exhausted + self.region_failed
    }
}

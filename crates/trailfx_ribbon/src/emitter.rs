//! Per-emitter ribbon state.

use trailfx_core::{BufferMode, SideCursor};

use crate::buffers::StripeRegion;
use crate::config::{CalcMode, EmitterConfig, RibbonConfig};
use crate::instance::StripeHandle;

/// Handle to an initialized emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterHandle(u32);

impl EmitterHandle {
    /// Handle for a raw emitter index.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Raw emitter index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the emitter table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything the engine keeps for one emitter between callbacks.
#[derive(Debug)]
pub struct EmitterPluginUserData {
    pub(crate) config: RibbonConfig,
    calc_mode: CalcMode,
    pub(crate) region: Option<StripeRegion>,
    /// A reservation failed once; later failures are not logged again.
    pub(crate) region_failed: bool,
    pub(crate) delayed_head: Option<StripeHandle>,
    pub(crate) delayed_count: usize,
    vertex_count_per_stripe: usize,
    vertex_slot_count: usize,
    max_stripe_count: usize,
    pub(crate) last_assigned: Option<StripeHandle>,
    emit_rate_max: f32,
    particle_life_max: f32,
    pub(crate) side: SideCursor,
    /// Active ribbons, capacity fixed to `max_stripe_count`.
    pub(crate) active: Vec<StripeHandle>,
}

impl EmitterPluginUserData {
    /// Sizes the emitter state. `pool_capacity` clamps the ribbon budget.
    #[must_use]
    pub fn new(config: &EmitterConfig, pool_capacity: usize, mode: BufferMode) -> Self {
        let max_stripe_count = config.max_stripe_count().min(pool_capacity);
        let vertex_count_per_stripe = config.ribbon.vertex_count_per_stripe();

        Self {
            config: config.ribbon.clone(),
            calc_mode: config.calc_mode,
            region: None,
            region_failed: false,
            delayed_head: None,
            delayed_count: 0,
            vertex_count_per_stripe,
            vertex_slot_count: max_stripe_count * vertex_count_per_stripe,
            max_stripe_count,
            last_assigned: None,
            emit_rate_max: config.emit_rate.max_value(),
            particle_life_max: config.particle_life.max_value(),
            side: SideCursor::new(mode),
            active: Vec::with_capacity(max_stripe_count),
        }
    }

    /// Snapshotted ribbon parameters.
    #[inline]
    #[must_use]
    pub const fn ribbon(&self) -> &RibbonConfig {
        &self.config
    }

    /// CPU or GPU simulation.
    #[inline]
    #[must_use]
    pub const fn calc_mode(&self) -> CalcMode {
        self.calc_mode
    }

    /// Whether the emitter's slot region is reserved.
    #[inline]
    #[must_use]
    pub const fn has_region(&self) -> bool {
        self.region.is_some()
    }

    /// Vertices one full ribbon writes.
    #[inline]
    #[must_use]
    pub const fn vertex_count_per_stripe(&self) -> usize {
        self.vertex_count_per_stripe
    }

    /// Vertices the whole budget can write per side.
    #[inline]
    #[must_use]
    pub const fn vertex_slot_count(&self) -> usize {
        self.vertex_slot_count
    }

    /// Ribbons alive at once, active or draining.
    #[inline]
    #[must_use]
    pub const fn max_stripe_count(&self) -> usize {
        self.max_stripe_count
    }

    /// Most recently created ribbon.
    #[inline]
    #[must_use]
    pub const fn last_assigned(&self) -> Option<StripeHandle> {
        self.last_assigned
    }

    /// Emission rate upper bound over the animation.
    #[inline]
    #[must_use]
    pub const fn emit_rate_max(&self) -> f32 {
        self.emit_rate_max
    }

    /// Particle life upper bound over the animation.
    #[inline]
    #[must_use]
    pub const fn particle_life_max(&self) -> f32 {
        self.particle_life_max
    }

    /// Side cursor of this emitter.
    #[inline]
    #[must_use]
    pub const fn side(&self) -> &SideCursor {
        &self.side
    }

    /// Ribbons owned by a live particle.
    #[inline]
    #[must_use]
    pub fn active(&self) -> &[StripeHandle] {
        &self.active
    }

    /// Ribbons draining after their particle died.
    #[inline]
    #[must_use]
    pub const fn delayed_count(&self) -> usize {
        self.delayed_count
    }

    /// Active plus draining ribbons.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.active.len() + self.delayed_count
    }

    /// Ribbons this emitter may hold: its reserved region once it has one,
    /// the configured maximum before that.
    #[inline]
    #[must_use]
    pub fn budget(&self) -> usize {
        self.region.map_or(self.max_stripe_count, |r| r.stripes())
    }

    /// Whether another ribbon fits the budget.
    #[inline]
    #[must_use]
    pub fn has_budget(&self) -> bool {
        self.live_count() < self.budget()
    }
}

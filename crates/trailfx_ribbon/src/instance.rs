//! # Stripe Instances
//!
//! One pooled ribbon: its history ring plus the per-ribbon state the
//! lifecycle controller and the mesh builder read.
//!
//! ```text
//!   Free ──create──▶ Active ──retire──▶ Delayed ──drained──▶ Free
//!                      │                                    ▲
//!                      └──────── retire (history empty) ────┘
//! ```

use trailfx_core::{HistoryRing, PoolHandle, Recycle};
use trailfx_shared::constants::MAX_BUFFER_SIDES;
use trailfx_shared::Vec3;

use crate::config::{RibbonConfig, SampleSpace};
use crate::emitter::EmitterHandle;
use crate::mesh::wing_direction;

/// Handle to a pooled ribbon.
pub type StripeHandle = PoolHandle;

/// One recorded instant of a ribbon's backbone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistorySample {
    /// Backbone position (world or emitter space, per config).
    pub position: Vec3,
    /// Smoothed travel direction at capture time.
    pub direction: Vec3,
    /// Unit wing computed at capture time; fallback for degenerate tangents.
    pub wing: Vec3,
    /// Emitter Y axis at capture time.
    pub emitter_y: Vec3,
    /// Particle scale at capture time.
    pub scale: f32,
    /// Cumulative travelled distance at capture time.
    pub journey: f32,
}

/// Lifecycle state of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripeState {
    /// In the pool.
    #[default]
    Free,
    /// Owned by a live particle.
    Active,
    /// Particle died; draining on its emitter's delayed list.
    Delayed,
}

/// What the host particle framework exposes about a particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    /// Position in world space.
    pub world_position: Vec3,
    /// Position in emitter space.
    pub local_position: Vec3,
    /// Velocity (any space; only its direction is used).
    pub velocity: Vec3,
    /// Emitter Y axis this tick.
    pub emitter_y: Vec3,
    /// Particle scale.
    pub scale: f32,
    /// Particle color, tints both ribbon colors.
    pub color: [f32; 4],
    /// Per-particle random vector; `None` draws one from the system seed.
    pub random: Option<[f32; 4]>,
}

impl ParticleState {
    /// A particle at rest at `position` (world and local), unit scale.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            world_position: position,
            local_position: position,
            velocity: Vec3::ZERO,
            emitter_y: Vec3::Y,
            scale: 1.0,
            color: [1.0; 4],
            random: None,
        }
    }

    /// Same particle with a velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Same particle with an emitter Y axis.
    #[must_use]
    pub const fn with_emitter_y(mut self, emitter_y: Vec3) -> Self {
        self.emitter_y = emitter_y;
        self
    }
}

/// Timing of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Monotonic tick number.
    pub tick: u64,
    /// Elapsed time in ticks (1.0 at nominal rate, 0.5 at half speed).
    pub delta: f32,
}

impl StepContext {
    /// A nominal-rate tick.
    #[must_use]
    pub const fn tick(tick: u64) -> Self {
        Self { tick, delta: 1.0 }
    }
}

/// One pooled ribbon trail.
#[derive(Debug)]
pub struct StripeInstance {
    state: StripeState,
    history: HistoryRing<HistorySample>,
    color0: [f32; 4],
    color1: [f32; 4],
    random: [f32; 4],
    /// Smoothed backbone direction.
    interp: Vec3,
    head_position: Vec3,
    time: f32,
    life: Option<f32>,
    /// Stable across buffer sides.
    vertex_offset: usize,
    /// Vertices written on each side, `0` = nothing drawable there.
    side_vertex_count: [u32; MAX_BUFFER_SIDES],
    last_tick: Option<u64>,
    journey: f32,
    sample_accum: f32,
    /// Ribbon life ran out; no more samples, drains one per tick.
    expired: bool,
    owner: Option<EmitterHandle>,
    pub(crate) next_delayed: Option<StripeHandle>,
}

impl StripeInstance {
    /// Builds a free slot with a pre-allocated ring.
    #[must_use]
    pub fn new(history_capacity: usize, vertex_offset: usize) -> Self {
        Self {
            state: StripeState::Free,
            history: HistoryRing::new(history_capacity),
            color0: [0.0; 4],
            color1: [0.0; 4],
            random: [0.0; 4],
            interp: Vec3::ZERO,
            head_position: Vec3::ZERO,
            time: 0.0,
            life: None,
            vertex_offset,
            side_vertex_count: [0; MAX_BUFFER_SIDES],
            last_tick: None,
            journey: 0.0,
            sample_accum: 0.0,
            expired: false,
            owner: None,
            next_delayed: None,
        }
    }

    /// Lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> StripeState {
        self.state
    }

    /// Whether the slot is Active or Delayed.
    #[inline]
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.state != StripeState::Free
    }

    /// Recorded history, oldest first.
    #[inline]
    #[must_use]
    pub const fn history(&self) -> &HistoryRing<HistorySample> {
        &self.history
    }

    /// Live history sample count.
    #[inline]
    #[must_use]
    pub const fn history_count(&self) -> usize {
        self.history.len()
    }

    /// Ribbon age in ticks.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Whether the ribbon life ran out.
    #[inline]
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.expired
    }

    /// Cumulative travelled distance.
    #[inline]
    #[must_use]
    pub const fn journey(&self) -> f32 {
        self.journey
    }

    /// Newest recorded position.
    #[inline]
    #[must_use]
    pub const fn head_position(&self) -> Vec3 {
        self.head_position
    }

    /// First vertex of this slot in the vertex store.
    #[inline]
    #[must_use]
    pub const fn vertex_offset(&self) -> usize {
        self.vertex_offset
    }

    /// Vertices written on `side`.
    #[inline]
    #[must_use]
    pub fn rendered_vertices(&self, side: usize) -> u32 {
        self.side_vertex_count.get(side).copied().unwrap_or(0)
    }

    /// Owning emitter.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> Option<EmitterHandle> {
        self.owner
    }

    /// Blend colors.
    #[inline]
    #[must_use]
    pub const fn colors(&self) -> ([f32; 4], [f32; 4]) {
        (self.color0, self.color1)
    }

    /// Random vector.
    #[inline]
    #[must_use]
    pub const fn random(&self) -> [f32; 4] {
        self.random
    }

    /// Configured life, if finite.
    #[inline]
    #[must_use]
    pub const fn life(&self) -> Option<f32> {
        self.life
    }

    /// Initializes a freshly acquired slot for a newborn particle.
    pub(crate) fn begin(
        &mut self,
        owner: EmitterHandle,
        config: &RibbonConfig,
        particle: &ParticleState,
        random: [f32; 4],
    ) {
        debug_assert_eq!(self.state, StripeState::Free, "begin on a used slot");

        self.history.reset_with_limit(config.history_len);
        self.color0 = tint(config.color0, particle.color);
        self.color1 = tint(config.color1, particle.color);
        self.random = random;
        self.interp = particle.velocity.try_normalize().unwrap_or(Vec3::ZERO);
        self.head_position = sample_position(config.space, particle);
        self.time = 0.0;
        self.life = config.life;
        self.side_vertex_count = [0; MAX_BUFFER_SIDES];
        self.last_tick = None;
        self.journey = 0.0;
        self.sample_accum = 0.0;
        self.expired = false;
        self.owner = Some(owner);
        self.next_delayed = None;
        self.state = StripeState::Active;
    }

    /// Records the tick and reports whether it was already stepped.
    pub(crate) fn mark_tick(&mut self, tick: u64) -> bool {
        let repeated = self.last_tick == Some(tick);
        self.last_tick = Some(tick);
        repeated
    }

    /// Applies the sampling policy for one tick.
    ///
    /// Returns `true` when a sample was pushed. Expired ribbons push nothing
    /// and drop their oldest sample instead.
    pub(crate) fn record(
        &mut self,
        config: &RibbonConfig,
        particle: &ParticleState,
        delta: f32,
    ) -> bool {
        if self.expired {
            self.history.pop_oldest();
            return false;
        }

        self.sample_accum += delta;
        let due = self.history.is_empty() || self.sample_accum >= config.sample_interval;
        if !due {
            return false;
        }
        self.sample_accum = (self.sample_accum - config.sample_interval).max(0.0);

        let position = sample_position(config.space, particle);
        let previous = self.history.newest().map(|s| s.position);

        let travel = particle
            .velocity
            .try_normalize()
            .or_else(|| previous.and_then(|p| (position - p).try_normalize()));
        if let Some(dir) = travel {
            self.interp = self
                .interp
                .lerp(dir, config.direction_interpolation)
                .normalize_or(dir);
        }

        if let Some(p) = previous {
            self.journey += position.distance(p);
        }

        let emitter_y = particle.emitter_y.normalize_or(Vec3::Y);
        let wing = wing_direction(config.kind, self.interp, emitter_y, Vec3::X);
        self.history.push(HistorySample {
            position,
            direction: self.interp,
            wing,
            emitter_y,
            scale: particle.scale,
            journey: self.journey,
        });
        self.head_position = position;
        true
    }

    /// Advances ribbon time; flags expiry once `time >= life`.
    pub(crate) fn advance_time(&mut self, delta: f32) {
        self.time += delta;
        if self.life.is_some_and(|life| self.time >= life) {
            self.expired = true;
        }
    }

    /// Drops the oldest sample (delayed drain). Returns the remaining count.
    pub(crate) fn drain_one(&mut self) -> usize {
        self.history.pop_oldest();
        self.history.len()
    }

    /// Moves the ribbon to the delayed state.
    pub(crate) fn mark_delayed(&mut self, next: Option<StripeHandle>) {
        debug_assert_eq!(self.state, StripeState::Active, "only active ribbons are delayed");
        self.state = StripeState::Delayed;
        self.next_delayed = next;
    }

    /// Records how many vertices were written on `side`.
    pub(crate) fn set_rendered(&mut self, side: usize, count: u32) {
        if let Some(slot) = self.side_vertex_count.get_mut(side) {
            *slot = count;
        }
    }
}

impl Recycle for StripeInstance {
    fn recycle(&mut self) {
        self.state = StripeState::Free;
        self.history.clear();
        self.side_vertex_count = [0; MAX_BUFFER_SIDES];
        self.last_tick = None;
        self.owner = None;
        self.next_delayed = None;
        self.expired = false;
        self.time = 0.0;
        self.journey = 0.0;
        self.sample_accum = 0.0;
    }
}

fn sample_position(space: SampleSpace, particle: &ParticleState) -> Vec3 {
    match space {
        SampleSpace::World => particle.world_position,
        SampleSpace::Emitter => particle.local_position,
    }
}

fn tint(color: [f32; 4], by: [f32; 4]) -> [f32; 4] {
    [
        color[0] * by[0],
        color[1] * by[1],
        color[2] * by[2],
        color[3] * by[3],
    ]
}

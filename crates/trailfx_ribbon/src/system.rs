//! # Stripe System
//!
//! Owner of every ribbon resource: the instance pool, the buffered stores,
//! the emitter table and the counters.
//!
//! ```text
//!  ┌──────────────────────────── StripeSystem ───────────────────────────┐
//!  │                                                                     │
//!  │  emitters: [Option<EmitterPluginUserData>]   (slab, handle = index) │
//!  │        │ active list / delayed list (indices)                       │
//!  │        ▼                                                            │
//!  │  pool: SlotPool<StripeInstance>  ── slot i ──▶ vertex window i      │
//!  │                                                 constant block i    │
//!  │  buffers: Arc<StripeBuffers>  ◀────── shared with the renderer      │
//!  └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use trailfx_core::SlotPool;

use crate::buffers::{RegionLedger, StripeBuffers};
use crate::config::{CalcMode, SystemConfig};
use crate::draw::{DrawCommand, DrawOutcome, DrawSink, MIN_STRIP_VERTICES};
use crate::emitter::{EmitterHandle, EmitterPluginUserData};
use crate::error::RibbonResult;
use crate::instance::{StripeHandle, StripeInstance};
use crate::mesh::mesh_type;
use crate::stats::StripeStats;

/// The ribbon-trail engine.
///
/// Everything is sized in [`StripeSystem::new`]; the per-tick callbacks
/// only move indices and write into pre-allocated storage.
pub struct StripeSystem {
    pub(crate) config: SystemConfig,
    pub(crate) pool: SlotPool<StripeInstance>,
    pub(crate) buffers: Arc<StripeBuffers>,
    pub(crate) ledger: RegionLedger,
    pub(crate) emitters: Vec<Option<EmitterPluginUserData>>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) stats: StripeStats,
}

impl StripeSystem {
    /// Builds the pool, the stores and every history ring.
    ///
    /// # Errors
    ///
    /// Returns the validation error of [`SystemConfig::validate`]; nothing
    /// is allocated in that case.
    pub fn new(config: SystemConfig) -> RibbonResult<Self> {
        config.validate()?;

        let history = config.max_history_len;
        let window = config.max_vertices_per_stripe;
        let pool = SlotPool::new(config.max_stripes, |slot| {
            StripeInstance::new(history, slot * window)
        });
        let buffers = Arc::new(StripeBuffers::new(&config));

        tracing::info!(
            max_stripes = config.max_stripes,
            max_history_len = config.max_history_len,
            max_vertices_per_stripe = config.max_vertices_per_stripe,
            sides = buffers.side_count(),
            "Stripe system initialized"
        );

        Ok(Self {
            ledger: RegionLedger::new(config.max_stripes),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            emitters: Vec::new(),
            stats: StripeStats::default(),
            pool,
            buffers,
            config,
        })
    }

    /// Sizing this system was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Stores shared with the renderer.
    #[inline]
    #[must_use]
    pub fn buffers(&self) -> Arc<StripeBuffers> {
        Arc::clone(&self.buffers)
    }

    /// Pool slots in use.
    #[inline]
    #[must_use]
    pub const fn used_count(&self) -> usize {
        self.pool.used_count()
    }

    /// Pool slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Slots still free to reserve for new emitters.
    #[inline]
    #[must_use]
    pub const fn unreserved_stripes(&self) -> usize {
        self.ledger.available()
    }

    /// A live ribbon.
    #[inline]
    #[must_use]
    pub fn stripe(&self, handle: StripeHandle) -> Option<&StripeInstance> {
        self.pool.get(handle)
    }

    /// An initialized emitter.
    #[inline]
    #[must_use]
    pub fn emitter(&self, handle: EmitterHandle) -> Option<&EmitterPluginUserData> {
        self.emitters.get(handle.index()).and_then(Option::as_ref)
    }

    /// Counters plus a snapshot of active and draining ribbons.
    #[must_use]
    pub fn stats(&self) -> StripeStats {
        let (active, delayed) = self
            .emitters
            .iter()
            .flatten()
            .fold((0, 0), |(a, d), e| (a + e.active.len(), d + e.delayed_count));
        StripeStats {
            active,
            delayed,
            ..self.stats
        }
    }

    /// Handles of an emitter's draining ribbons, newest retire first.
    pub fn delayed_stripes(&self, emitter: EmitterHandle) -> impl Iterator<Item = StripeHandle> + '_ {
        let mut cursor = self.emitter(emitter).and_then(|e| e.delayed_head);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.pool.get(current).and_then(|s| s.next_delayed);
            Some(current)
        })
    }

    /// Submits one command per drawable ribbon of `emitter`, reading the
    /// emitter's read side.
    ///
    /// Ribbons with fewer than [`MIN_STRIP_VERTICES`] vertices on that side
    /// are skipped. GPU-simulated emitters and unknown handles report
    /// [`DrawOutcome::NotHandled`].
    pub fn draw(&self, emitter: EmitterHandle, sink: &mut dyn DrawSink) -> DrawOutcome {
        let Some(data) = self.emitter(emitter) else {
            return DrawOutcome::NotHandled;
        };
        if data.calc_mode() == CalcMode::Gpu {
            return DrawOutcome::NotHandled;
        }

        let side = data.side.read_side();
        let planes = data.config.plane_count();
        let tag = mesh_type(&data.config);
        let mut commands = 0;

        for handle in data.active.iter().copied().chain(self.delayed_stripes(emitter)) {
            let Some(stripe) = self.pool.get(handle) else {
                continue;
            };
            let count = stripe.rendered_vertices(side);
            if count < MIN_STRIP_VERTICES {
                continue;
            }
            sink.submit(DrawCommand {
                emitter,
                side,
                first_vertex: stripe.vertex_offset(),
                vertex_count: count as usize,
                constant_slot: handle.index(),
                planes,
                mesh_type: tag,
            });
            commands += 1;
        }

        DrawOutcome::Handled { commands }
    }
}

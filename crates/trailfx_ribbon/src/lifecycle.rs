//! # Ribbon Lifecycle
//!
//! `Free → Active → (Delayed) → Free`, driven by the host's particle
//! callbacks:
//!
//! | Host event            | Operation                                |
//! |-----------------------|------------------------------------------|
//! | emitter created       | [`StripeSystem::initialize_emitter`]     |
//! | particle born         | [`StripeSystem::create`]                 |
//! | particle simulated    | [`StripeSystem::step`]                   |
//! | particle died         | [`StripeSystem::retire`]                 |
//! | tick start / end      | [`StripeSystem::pre_calculate`] / [`StripeSystem::post_calculate`] |
//! | emitter destroyed     | [`StripeSystem::finalize_emitter`]       |
//!
//! Capacity misses are silent: the particle simply has no trail and the
//! miss is counted in [`crate::StripeStats`].

use rand::Rng;

use crate::config::EmitterConfig;
use crate::emitter::{EmitterHandle, EmitterPluginUserData};
use crate::error::{RibbonError, RibbonResult};
use crate::instance::{ParticleState, StepContext, StripeHandle, StripeState};
use crate::mesh::{build_constants, build_strip};
use crate::system::StripeSystem;

impl StripeSystem {
    /// Validates an emitter's config and allocates its state.
    ///
    /// The slot region is reserved lazily, on the first [`Self::create`].
    ///
    /// # Errors
    ///
    /// Returns the config's validation error, [`RibbonError::HistoryTooLong`]
    /// or [`RibbonError::VertexCountTooLarge`] when the ribbon does not fit
    /// the pooled slots.
    pub fn initialize_emitter(&mut self, config: &EmitterConfig) -> RibbonResult<EmitterHandle> {
        config.validate()?;
        self.config.check_ribbon(&config.ribbon)?;

        let data = EmitterPluginUserData::new(config, self.pool.capacity(), self.config.buffer_mode);
        let index = match self.emitters.iter().position(Option::is_none) {
            Some(free) => free,
            None => {
                self.emitters.push(None);
                self.emitters.len() - 1
            }
        };
        let raw = u32::try_from(index)
            .map_err(|_| RibbonError::InvalidConfig(format!("emitter index {index} overflows")))?;

        tracing::info!(
            emitter = raw,
            max_stripes = data.max_stripe_count(),
            vertices_per_stripe = data.vertex_count_per_stripe(),
            "Ribbon emitter initialized"
        );
        self.emitters[index] = Some(data);
        Ok(EmitterHandle::from_raw(raw))
    }

    /// Starts a ribbon for a newborn particle.
    ///
    /// Returns `None` when the emitter's region cannot be reserved, its
    /// budget is spent or the pool is exhausted.
    pub fn create(&mut self, emitter: EmitterHandle, particle: &ParticleState) -> Option<StripeHandle> {
        let data = self.emitters.get_mut(emitter.index()).and_then(Option::as_mut);
        debug_assert!(data.is_some(), "create on unknown emitter {}", emitter.raw());
        let data = data?;

        if data.region.is_none() {
            if let Some(region) = self.ledger.reserve(data.max_stripe_count()) {
                if region.stripes() < data.max_stripe_count() {
                    tracing::warn!(
                        emitter = emitter.raw(),
                        requested = data.max_stripe_count(),
                        granted = region.stripes(),
                        "Ribbon region trimmed to the free slots"
                    );
                }
                data.region = Some(region);
            } else {
                self.stats.region_failed += 1;
                if !data.region_failed {
                    data.region_failed = true;
                    tracing::warn!(
                        emitter = emitter.raw(),
                        requested = data.max_stripe_count(),
                        available = self.ledger.available(),
                        "Ribbon region could not be reserved, emitter draws no trails"
                    );
                }
                return None;
            }
        }

        if !data.has_budget() {
            self.stats.emitter_budget_exhausted += 1;
            tracing::debug!(emitter = emitter.raw(), "Ribbon budget spent");
            return None;
        }

        let Some(handle) = self.pool.acquire() else {
            self.stats.pool_exhausted += 1;
            tracing::debug!(emitter = emitter.raw(), "Ribbon pool exhausted");
            return None;
        };

        let random = particle
            .random
            .unwrap_or_else(|| std::array::from_fn(|_| self.rng.gen::<f32>()));
        if let Some(stripe) = self.pool.get_mut(handle) {
            stripe.begin(emitter, &data.config, particle, random);
        }
        data.active.push(handle);
        data.last_assigned = Some(handle);
        self.stats.created += 1;
        Some(handle)
    }

    /// Advances one active ribbon by one tick.
    ///
    /// Records a sample when the sampling policy allows it, rebuilds the
    /// mesh into the emitter's write side, then advances ribbon time.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when the ribbon is not active for this
    /// emitter or is stepped twice in one tick.
    pub fn step(
        &mut self,
        emitter: EmitterHandle,
        stripe: StripeHandle,
        particle: &ParticleState,
        ctx: &StepContext,
    ) {
        let Some(data) = self.emitters.get(emitter.index()).and_then(Option::as_ref) else {
            return;
        };
        let inst = self.pool.get_mut(stripe);
        debug_assert!(
            inst.as_ref()
                .is_some_and(|s| s.state() == StripeState::Active && s.owner() == Some(emitter)),
            "step on a ribbon that is not active for emitter {}",
            emitter.raw()
        );
        let Some(inst) = inst else {
            return;
        };
        if inst.state() != StripeState::Active || inst.owner() != Some(emitter) {
            return;
        }

        let repeated = inst.mark_tick(ctx.tick);
        debug_assert!(!repeated, "Ribbon stepped twice in tick {}", ctx.tick);

        inst.record(&data.config, particle, ctx.delta);

        let side = data.side.write_side();
        let written = self
            .buffers
            .write_stripe(side, stripe.index(), |dst| build_strip(inst.history(), &data.config, dst));
        inst.set_rendered(side, u32::try_from(written).unwrap_or(u32::MAX));
        self.buffers
            .write_constants(side, stripe.index(), build_constants(inst, &data.config, written));
        self.stats.vertices_written += written as u64;

        inst.advance_time(ctx.delta);
    }

    /// Ends a ribbon's particle.
    ///
    /// A ribbon with no history goes straight back to the pool; otherwise it
    /// joins the emitter's delayed list and drains one sample per tick.
    pub fn retire(&mut self, emitter: EmitterHandle, stripe: StripeHandle) {
        let Some(data) = self.emitters.get_mut(emitter.index()).and_then(Option::as_mut) else {
            return;
        };
        let inst = self.pool.get_mut(stripe);
        debug_assert!(
            inst.as_ref().is_some_and(|s| s.state() == StripeState::Active),
            "retire on a ribbon that is not active: slot {}",
            stripe.index()
        );
        let Some(inst) = inst else {
            return;
        };
        if inst.state() != StripeState::Active || inst.owner() != Some(emitter) {
            return;
        }

        if let Some(pos) = data.active.iter().position(|&h| h == stripe) {
            data.active.swap_remove(pos);
        }

        if inst.history_count() == 0 {
            self.pool.release(stripe);
            self.stats.released += 1;
        } else {
            inst.mark_delayed(data.delayed_head);
            data.delayed_head = Some(stripe);
            data.delayed_count += 1;
        }
    }

    /// Drains every delayed ribbon of `emitter` by one sample.
    ///
    /// A ribbon whose history empties is unlinked and released, exactly
    /// once; the others get their shorter mesh rebuilt.
    pub fn drain_delayed(&mut self, emitter: EmitterHandle) {
        let Some(data) = self.emitters.get_mut(emitter.index()).and_then(Option::as_mut) else {
            return;
        };
        let side = data.side.write_side();

        let mut prev: Option<StripeHandle> = None;
        let mut cursor = data.delayed_head;
        while let Some(handle) = cursor {
            let inst = self.pool.get_mut(handle);
            debug_assert!(inst.is_some(), "free slot {} on delayed list", handle.index());
            let Some(inst) = inst else {
                break;
            };
            let next = inst.next_delayed;

            if inst.drain_one() == 0 {
                match prev {
                    None => data.delayed_head = next,
                    Some(p) => {
                        if let Some(prev_inst) = self.pool.get_mut(p) {
                            prev_inst.next_delayed = next;
                        }
                    }
                }
                self.pool.release(handle);
                data.delayed_count -= 1;
                self.stats.released += 1;
            } else {
                let written = self
                    .buffers
                    .write_stripe(side, handle.index(), |dst| build_strip(inst.history(), &data.config, dst));
                inst.set_rendered(side, u32::try_from(written).unwrap_or(u32::MAX));
                self.buffers
                    .write_constants(side, handle.index(), build_constants(inst, &data.config, written));
                self.stats.vertices_written += written as u64;
                prev = Some(handle);
            }

            cursor = next;
        }
    }

    /// Tick start for `emitter`: swaps its buffer side on simulation ticks.
    pub fn pre_calculate(&mut self, emitter: EmitterHandle, is_swap_tick: bool) {
        if let Some(data) = self.emitters.get_mut(emitter.index()).and_then(Option::as_mut) {
            if is_swap_tick {
                data.side.swap_side();
            }
        }
    }

    /// Tick end for `emitter`: drains delayed ribbons and closes the tick.
    pub fn post_calculate(&mut self, emitter: EmitterHandle) {
        self.drain_delayed(emitter);
        if let Some(data) = self.emitters.get_mut(emitter.index()).and_then(Option::as_mut) {
            data.side.close_tick();
        }
    }

    /// Releases every ribbon of `emitter` and forgets it.
    ///
    /// Returns `false` for an unknown handle.
    pub fn finalize_emitter(&mut self, emitter: EmitterHandle) -> bool {
        let Some(data) = self.emitters.get_mut(emitter.index()).and_then(Option::take) else {
            return false;
        };

        let mut released = 0u64;
        for &handle in &data.active {
            if self.pool.release(handle) {
                released += 1;
            }
        }
        let mut cursor = data.delayed_head;
        while let Some(handle) = cursor {
            cursor = self.pool.get(handle).and_then(|s| s.next_delayed);
            if self.pool.release(handle) {
                released += 1;
            }
        }
        if let Some(region) = data.region {
            self.ledger.free(region);
        }
        self.stats.released += released;

        tracing::info!(emitter = emitter.raw(), released, "Ribbon emitter finalized");
        true
    }
}

//! Host particle framework interface.
//!
//! The host owns particle lifetime and timing and calls these eight hooks.
//! Per tick, for each emitter:
//!
//! ```text
//! on_emitter_pre_calculate(is_swap_tick)
//!   for each particle: on_particle_emit / on_particle_calculate / on_particle_remove
//! on_emitter_post_calculate
//! on_emitter_draw(sink)
//! ```

use crate::config::EmitterConfig;
use crate::draw::{DrawOutcome, DrawSink};
use crate::emitter::EmitterHandle;
use crate::error::RibbonResult;
use crate::instance::{ParticleState, StepContext, StripeHandle};
use crate::system::StripeSystem;

/// Ribbon-trail callbacks of a particle framework.
pub trait RibbonTrailPlugin {
    /// Sizes and registers an emitter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the emitter's ribbon cannot be
    /// served by this plugin.
    fn on_emitter_initialize(&mut self, config: &EmitterConfig) -> RibbonResult<EmitterHandle>;

    /// A particle was born. `None` means it has no trail.
    fn on_particle_emit(&mut self, emitter: EmitterHandle, particle: &ParticleState) -> Option<StripeHandle>;

    /// A particle with a trail was simulated.
    fn on_particle_calculate(
        &mut self,
        emitter: EmitterHandle,
        stripe: StripeHandle,
        particle: &ParticleState,
        ctx: &StepContext,
    );

    /// A particle with a trail died.
    fn on_particle_remove(&mut self, emitter: EmitterHandle, stripe: StripeHandle);

    /// Tick start.
    fn on_emitter_pre_calculate(&mut self, emitter: EmitterHandle, is_swap_tick: bool);

    /// Tick end.
    fn on_emitter_post_calculate(&mut self, emitter: EmitterHandle);

    /// Submits the emitter's ribbons.
    fn on_emitter_draw(&self, emitter: EmitterHandle, sink: &mut dyn DrawSink) -> DrawOutcome;

    /// The emitter is destroyed.
    fn on_emitter_finalize(&mut self, emitter: EmitterHandle);
}

impl RibbonTrailPlugin for StripeSystem {
    fn on_emitter_initialize(&mut self, config: &EmitterConfig) -> RibbonResult<EmitterHandle> {
        self.initialize_emitter(config)
    }

    fn on_particle_emit(&mut self, emitter: EmitterHandle, particle: &ParticleState) -> Option<StripeHandle> {
        self.create(emitter, particle)
    }

    fn on_particle_calculate(
        &mut self,
        emitter: EmitterHandle,
        stripe: StripeHandle,
        particle: &ParticleState,
        ctx: &StepContext,
    ) {
        self.step(emitter, stripe, particle, ctx);
    }

    fn on_particle_remove(&mut self, emitter: EmitterHandle, stripe: StripeHandle) {
        self.retire(emitter, stripe);
    }

    fn on_emitter_pre_calculate(&mut self, emitter: EmitterHandle, is_swap_tick: bool) {
        self.pre_calculate(emitter, is_swap_tick);
    }

    fn on_emitter_post_calculate(&mut self, emitter: EmitterHandle) {
        self.post_calculate(emitter);
    }

    fn on_emitter_draw(&self, emitter: EmitterHandle, sink: &mut dyn DrawSink) -> DrawOutcome {
        self.draw(emitter, sink)
    }

    fn on_emitter_finalize(&mut self, emitter: EmitterHandle) {
        if !self.finalize_emitter(emitter) {
            tracing::debug!(emitter = emitter.raw(), "Finalize on unknown emitter");
        }
    }
}

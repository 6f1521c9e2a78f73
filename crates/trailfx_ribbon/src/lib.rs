//! # TRAILFX Ribbon Engine
//!
//! Trailing ribbons ("stripes") for particle effects:
//! - Each ribbon records a short history of its particle's path
//! - Every tick the history is turned into a triangle strip
//! - Strips are written into buffered storage the renderer reads a tick later
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        SIMULATION TICK                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  pre_calculate ─▶ swap write side                                │
//! │  step          ─▶ sample ─▶ HistoryRing ─▶ build_strip ─▶ side W │
//! │  retire        ─▶ delayed list                                   │
//! │  post_calculate─▶ drain delayed ─▶ build_strip ─▶ side W         │
//! │  draw          ─▶ DrawCommand(side R) ─▶ DrawSink ─▶ renderer    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ARCHITECT'S MANDATE
//!
//! - Every slot is sized at start, no allocations per tick
//! - Pool exhaustion means "no trail", never a crash
//! - The renderer never reads the side being written
//!
//! ## Example
//!
//! ```rust
//! use trailfx_ribbon::{
//!     DrawOutcome, EmitterConfig, ParticleState, RibbonTrailPlugin, StepContext, StripeSystem,
//!     SystemConfig,
//! };
//! use trailfx_shared::Vec3;
//!
//! let mut system = StripeSystem::new(SystemConfig::default()).unwrap();
//! let emitter = system.on_emitter_initialize(&EmitterConfig::default()).unwrap();
//! let stripe = system
//!     .on_particle_emit(emitter, &ParticleState::at(Vec3::ZERO))
//!     .unwrap();
//!
//! for tick in 0..8u8 {
//!     system.on_emitter_pre_calculate(emitter, true);
//!     let particle = ParticleState::at(Vec3::new(f32::from(tick), 0.0, 0.0));
//!     system.on_particle_calculate(emitter, stripe, &particle, &StepContext::tick(tick.into()));
//!     system.on_emitter_post_calculate(emitter);
//! }
//!
//! let mut commands = Vec::new();
//! assert_eq!(system.on_emitter_draw(emitter, &mut commands), DrawOutcome::Handled { commands: 1 });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffers;
pub mod config;
pub mod draw;
pub mod emitter;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod mesh;
pub mod plugin;
pub mod stats;
pub mod system;
pub mod vertex;

pub use buffers::{RegionLedger, StripeBuffers, StripeRegion};
pub use config::{
    AnimatedValue, AnimationKey, BackboneMode, CalcMode, EmitterConfig, RibbonConfig, SampleSpace,
    StripeKind, SystemConfig, TextureMode,
};
pub use draw::{DrawCommand, DrawOutcome, DrawSink, MIN_STRIP_VERTICES};
pub use emitter::{EmitterHandle, EmitterPluginUserData};
pub use error::{RibbonError, RibbonResult};
pub use instance::{HistorySample, ParticleState, StepContext, StripeHandle, StripeInstance, StripeState};
pub use mesh::{build_constants, build_strip, mesh_type, wing_direction};
pub use plugin::RibbonTrailPlugin;
pub use stats::StripeStats;
pub use system::StripeSystem;
pub use vertex::{MeshType, StripeConstants, StripeVertex};

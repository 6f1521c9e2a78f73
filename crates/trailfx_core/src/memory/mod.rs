//! # Memory Management
//!
//! Pre-allocated rings and pools for zero-allocation ribbon simulation.
//!
//! ## Design Philosophy
//!
//! All memory is allocated once at system start. During simulation:
//! - No heap allocations
//! - Slots are overwritten in place, never individually freed
//! - Predictable, flat latency

mod pool;
mod ring;

pub use pool::{PoolHandle, Recycle, SlotPool};
pub use ring::HistoryRing;

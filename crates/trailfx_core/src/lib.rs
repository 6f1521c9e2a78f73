//! # TRAILFX Core
//!
//! Fixed-capacity containers the ribbon engine is built on:
//! - Ribbon history lives in a [`HistoryRing`]
//! - Ribbon instances live in a [`SlotPool`]
//! - Ribbon meshes are written into a [`BufferedStore`]
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations after setup** - every container is sized once
//! 2. **Arena + index** - no pointer chains, handles are plain indices
//! 3. **One writer, one reader** - the side swap is the only hand-off
//!
//! ## Example
//!
//! ```rust
//! use trailfx_core::{HistoryRing, SlotPool, Recycle};
//!
//! #[derive(Default)]
//! struct Trail { ring: Option<HistoryRing<f32>> }
//!
//! impl Recycle for Trail {
//!     fn recycle(&mut self) {
//!         if let Some(ring) = self.ring.as_mut() { ring.clear(); }
//!     }
//! }
//!
//! let mut pool = SlotPool::new(4, |_| Trail { ring: Some(HistoryRing::new(8)) });
//! let handle = pool.acquire().expect("pool has room");
//! assert!(pool.release(handle));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod sync;

pub use memory::{HistoryRing, PoolHandle, Recycle, SlotPool};
pub use sync::{BufferMode, BufferedStore, SideCursor};

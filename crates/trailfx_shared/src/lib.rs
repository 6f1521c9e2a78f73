//! # TRAILFX Shared
//!
//! Common types used by both the simulation side and the render side of
//! the ribbon engine.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `wgpu`
//! - Any GPU or window-related crate
//!
//! If you need graphics types, put them in `trailfx_ribbon`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    DEFAULT_HISTORY_LEN, DEFAULT_MAX_HISTORY_LEN, DEFAULT_MAX_STRIPES,
    DEFAULT_MAX_VERTICES_PER_STRIPE, LENGTH_EPSILON, MAX_BUFFER_SIDES, MAX_SUBDIVISIONS,
};
pub use math::Vec3;

//! # Engine Constants
//!
//! Default sizing for the ribbon engine.
//!
//! **CRITICAL:** The pool and the vertex store are sized from these values
//! once, at system start. Nothing grows at runtime.

// =============================================================================
// POOL SIZING
// =============================================================================

/// Default number of simultaneous ribbons across every emitter of a system.
pub const DEFAULT_MAX_STRIPES: usize = 256;

/// Default physical history capacity of every pooled ribbon.
///
/// A ribbon config may use a shorter window, never a longer one.
pub const DEFAULT_MAX_HISTORY_LEN: usize = 64;

/// Default history window of a single ribbon config.
pub const DEFAULT_HISTORY_LEN: usize = 16;

// =============================================================================
// VERTEX STORE SIZING
// =============================================================================

/// Default vertex slot reserved per pooled ribbon.
///
/// Covers a 64-sample direct ribbon in cross topology (64 * 2 * 2).
pub const DEFAULT_MAX_VERTICES_PER_STRIPE: usize = 256;

/// Upper bound on buffer sides (triple buffering).
pub const MAX_BUFFER_SIDES: usize = 3;

// =============================================================================
// MESH LIMITS
// =============================================================================

/// Upper bound on synthesized points between two history samples.
pub const MAX_SUBDIVISIONS: u32 = 8;

/// Lengths below this are treated as zero when normalizing.
pub const LENGTH_EPSILON: f32 = 1.0e-6;

//! # Ribbon Error Types
//!
//! Configuration errors refuse setup. Capacity exhaustion is never an error
//! value; it is counted in [`crate::StripeStats`] instead.

use thiserror::Error;

/// Errors that can occur while setting up the ribbon engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RibbonError {
    /// The system pool was configured with no ribbon slots.
    #[error("stripe pool capacity must be greater than zero")]
    ZeroStripeCapacity,

    /// A history ring was configured with no samples.
    #[error("history length must be greater than zero")]
    ZeroHistoryLength,

    /// A vertex slot was configured with no vertices.
    #[error("vertex count per stripe must be greater than zero")]
    ZeroVertexCount,

    /// A ribbon asks for more history than the pooled rings hold.
    #[error("history length {requested} exceeds pooled ring capacity {capacity}")]
    HistoryTooLong {
        /// History length requested by the ribbon config.
        requested: usize,
        /// Physical ring capacity of every pool slot.
        capacity: usize,
    },

    /// A ribbon mesh does not fit the per-stripe vertex slot.
    #[error("ribbon needs {required} vertices per stripe, slot holds {slot}")]
    VertexCountTooLarge {
        /// Vertices the ribbon mesh needs.
        required: usize,
        /// Vertices reserved per pool slot.
        slot: usize,
    },

    /// The vertex store is smaller than `max_stripes * vertices_per_stripe`.
    #[error("vertex store holds {capacity} vertices per side, {required} required")]
    StoreUndersized {
        /// Configured vertices per side.
        capacity: usize,
        /// Vertices per side the pool can address.
        required: usize,
    },

    /// A numeric parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A ribbon resource file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

/// Result type for ribbon setup operations.
pub type RibbonResult<T> = Result<T, RibbonError>;

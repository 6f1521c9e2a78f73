//! Buffer side selection.

use serde::{Deserialize, Serialize};

/// How many copies of the vertex/constant storage are kept in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// No pipelining. Writer and reader share the single side in turn.
    Single,
    /// Render reads the side written one tick ago.
    #[default]
    Double,
    /// Render reads the side written two ticks ago.
    Triple,
}

impl BufferMode {
    /// Number of sides this mode keeps.
    #[inline]
    #[must_use]
    pub const fn side_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }
}

/// Write/read side bookkeeping for one producer.
///
/// `swap_side` is called exactly once per tick, before any write of that
/// tick. `close_tick` marks the tick boundary and re-arms the swap.
///
/// ## Usage
///
/// ```rust
/// use trailfx_core::{BufferMode, SideCursor};
///
/// let mut cursor = SideCursor::new(BufferMode::Double);
/// cursor.swap_side();
/// assert_eq!(cursor.write_side(), 1);
/// assert_eq!(cursor.read_side(), 0);
/// cursor.close_tick();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideCursor {
    /// Side the simulation writes this tick.
    write: usize,
    /// Number of sides, `1..=3`.
    sides: usize,
    /// Whether a swap is allowed (tick boundary crossed since the last one).
    armed: bool,
    /// Swaps performed since creation.
    swaps: u64,
}

impl SideCursor {
    /// Creates a cursor writing side 0.
    #[must_use]
    pub const fn new(mode: BufferMode) -> Self {
        Self {
            write: 0,
            sides: mode.side_count(),
            armed: true,
            swaps: 0,
        }
    }

    /// Side the simulation writes this tick.
    #[inline]
    #[must_use]
    pub const fn write_side(&self) -> usize {
        self.write
    }

    /// Side the render step reads this tick.
    ///
    /// `N-1` for double buffering, `N-2` for triple, `N` for single.
    #[inline]
    #[must_use]
    pub const fn read_side(&self) -> usize {
        (self.write + 1) % self.sides
    }

    /// Number of sides.
    #[inline]
    #[must_use]
    pub const fn side_count(&self) -> usize {
        self.sides
    }

    /// Swaps performed since creation.
    #[inline]
    #[must_use]
    pub const fn swap_count(&self) -> u64 {
        self.swaps
    }

    /// Advances the write side.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when called twice without `close_tick` in
    /// between. Release builds still advance modulo the side count.
    pub fn swap_side(&mut self) {
        debug_assert!(self.armed, "SwapSide called twice in one tick");
        self.write = (self.write + 1) % self.sides;
        self.armed = false;
        self.swaps += 1;
    }

    /// Marks the end of the tick; the next tick may swap again.
    #[inline]
    pub fn close_tick(&mut self) {
        self.armed = true;
    }
}

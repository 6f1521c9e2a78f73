//! Vertex and constant storage shared with the render step.
//!
//! Every pool slot owns a fixed window of the vertex store
//! (`slot * vertices_per_stripe`) and one constant block, on every side.
//! The stores are sized once at system start; nothing here allocates
//! per tick.

use std::ops::Range;

use parking_lot::MappedRwLockReadGuard;
use trailfx_core::{BufferMode, BufferedStore};

use crate::config::SystemConfig;
use crate::draw::DrawCommand;
use crate::vertex::{StripeConstants, StripeVertex};

/// Buffered vertex and constant stores for every ribbon slot.
///
/// Shared with a render thread through `Arc<StripeBuffers>`: the simulation
/// writes the emitter's write side, the renderer reads the side named in a
/// [`DrawCommand`].
pub struct StripeBuffers {
    vertices: BufferedStore<StripeVertex>,
    constants: BufferedStore<StripeConstants>,
    vertices_per_stripe: usize,
    stripe_capacity: usize,
}

impl StripeBuffers {
    /// Allocates both stores for a validated system config.
    ///
    /// An unvalidated config whose size overflows gets an empty vertex
    /// store.
    ///
    /// # Note
    /// This allocates `side_count * vertex_capacity` vertices. Call once
    /// during setup.
    #[must_use]
    pub fn new(config: &SystemConfig) -> Self {
        let vertex_len = config
            .vertex_capacity
            .or_else(|| config.required_vertices())
            .unwrap_or(0);

        Self {
            vertices: BufferedStore::new(config.buffer_mode, vertex_len),
            constants: BufferedStore::new(config.buffer_mode, config.max_stripes),
            vertices_per_stripe: config.max_vertices_per_stripe,
            stripe_capacity: config.max_stripes,
        }
    }

    /// Buffering policy.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> BufferMode {
        self.vertices.mode()
    }

    /// Number of sides.
    #[inline]
    #[must_use]
    pub fn side_count(&self) -> usize {
        self.vertices.side_count()
    }

    /// Vertex window per slot.
    #[inline]
    #[must_use]
    pub const fn vertices_per_stripe(&self) -> usize {
        self.vertices_per_stripe
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn stripe_capacity(&self) -> usize {
        self.stripe_capacity
    }

    /// Vertex store.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> &BufferedStore<StripeVertex> {
        &self.vertices
    }

    /// Constant store.
    #[inline]
    #[must_use]
    pub const fn constants(&self) -> &BufferedStore<StripeConstants> {
        &self.constants
    }

    /// Vertex window of a slot.
    #[inline]
    #[must_use]
    pub const fn slot_range(&self, slot: usize) -> Range<usize> {
        let start = slot.saturating_mul(self.vertices_per_stripe);
        start..start.saturating_add(self.vertices_per_stripe)
    }

    /// Lets `build` fill the vertex window of `slot` on `side`.
    ///
    /// Returns what `build` returns, the vertex count written. A slot past
    /// the store writes nothing.
    pub fn write_stripe(
        &self,
        side: usize,
        slot: usize,
        build: impl FnOnce(&mut [StripeVertex]) -> usize,
    ) -> usize {
        let range = self.slot_range(slot);
        let mut data = self.vertices.write_side(side);
        match data.get_mut(range) {
            Some(window) => build(window),
            None => 0,
        }
    }

    /// Stores the constant block of `slot` on `side`.
    pub fn write_constants(&self, side: usize, slot: usize, constants: StripeConstants) {
        self.constants.write(side, slot, &[constants]);
    }

    /// Constant block of `slot` on `side`.
    #[must_use]
    pub fn read_constants(&self, side: usize, slot: usize) -> Option<StripeConstants> {
        self.constants.read_side(side).get(slot).copied()
    }

    /// Shared view of the vertices a command draws.
    #[must_use]
    pub fn command_vertices(&self, command: &DrawCommand) -> MappedRwLockReadGuard<'_, [StripeVertex]> {
        let range = command.vertex_range();
        MappedRwLockReadGuard::map(self.vertices.read_side(command.side), |side| {
            let end = range.end.min(side.len());
            let start = range.start.min(end);
            &side[start..end]
        })
    }

    /// Appends the raw vertex bytes of a command to `out` for GPU upload.
    pub fn copy_command_bytes(&self, command: &DrawCommand, out: &mut Vec<u8>) {
        self.vertices.copy_bytes(command.side, command.vertex_range(), out);
    }
}

/// Stripe slots reserved by one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeRegion {
    stripes: usize,
}

impl StripeRegion {
    /// Reserved slot count.
    #[inline]
    #[must_use]
    pub const fn stripes(&self) -> usize {
        self.stripes
    }
}

/// Accounting of emitter reservations against the slot capacity.
///
/// The sum of every live reservation never exceeds the capacity, so an
/// emitter holding a region always finds room in its budget. A request
/// larger than what is left is trimmed to the remainder; only an exhausted
/// ledger refuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLedger {
    capacity: usize,
    reserved: usize,
}

impl RegionLedger {
    /// Empty ledger over `capacity` slots.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            reserved: 0,
        }
    }

    /// Slots currently reserved.
    #[inline]
    #[must_use]
    pub const fn reserved(&self) -> usize {
        self.reserved
    }

    /// Slots still free to reserve.
    #[inline]
    #[must_use]
    pub const fn available(&self) -> usize {
        self.capacity - self.reserved
    }

    /// Reserves up to `stripes` slots, `None` when no slot is left.
    pub fn reserve(&mut self, stripes: usize) -> Option<StripeRegion> {
        let stripes = stripes.min(self.available());
        if stripes == 0 {
            return None;
        }
        self.reserved += stripes;
        Some(StripeRegion { stripes })
    }

    /// Returns a reservation.
    pub fn free(&mut self, region: StripeRegion) {
        debug_assert!(region.stripes <= self.reserved, "Region freed twice");
        self.reserved = self.reserved.saturating_sub(region.stripes);
    }
}

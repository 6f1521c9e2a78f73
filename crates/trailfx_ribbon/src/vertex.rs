//! GPU layouts written by the mesh builder.
//!
//! Both structs are `vec4`-aligned so they can be uploaded as-is.

use bytemuck::{Pod, Zeroable};

/// One ribbon vertex. Two per backbone point (left/right), per plane.
///
/// The rendered position is `position.xyz + wing.xyz * wing.w`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StripeVertex {
    /// Backbone point (xyz) + width scale fade (w)
    pub position: [f32; 4],
    /// Backbone tangent (xyz) + alpha fade (w)
    pub tangent: [f32; 4],
    /// Half-width wing vector (xyz) + side sign, -1 or +1 (w)
    pub wing: [f32; 4],
    /// Emitter Y axis at capture time (xyz) + plane index (w)
    pub emitter_y: [f32; 4],
    /// Texture U, texture V, normalized position along ribbon, unused
    pub tex: [f32; 4],
}

impl StripeVertex {
    /// Size of a vertex in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Final position of the expanded vertex.
    #[inline]
    #[must_use]
    pub fn expanded_position(&self) -> [f32; 3] {
        let side = self.wing[3];
        [
            self.position[0] + self.wing[0] * side,
            self.position[1] + self.wing[1] * side,
            self.position[2] + self.wing[2] * side,
        ]
    }

    /// Texture V coordinate.
    #[inline]
    #[must_use]
    pub const fn tex_v(&self) -> f32 {
        self.tex[1]
    }
}

/// Mesh topology tag stored in the constant block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MeshType {
    /// Single plane, direct backbone.
    Direct = 0,
    /// Single plane, subdivided backbone.
    Subdivided = 1,
    /// Two planes, direct backbone.
    CrossDirect = 2,
    /// Two planes, subdivided backbone.
    CrossSubdivided = 3,
}

/// Per-ribbon constant block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StripeConstants {
    /// First blend color (rgba)
    pub color0: [f32; 4],
    /// Second blend color (rgba)
    pub color1: [f32; 4],
    /// Random vector
    pub random: [f32; 4],
    /// Head alpha, tail alpha, head scale, tail scale
    pub fade: [f32; 4],
    /// Ribbon time, rendered vertex count, mesh type, life
    pub params: [f32; 4],
    /// Newest backbone point (xyz) + history sample count (w)
    pub head_position: [f32; 4],
}

impl StripeConstants {
    /// Size of a constant block in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Rendered vertex count stored in `params`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn vertex_count(&self) -> u32 {
        self.params[1] as u32
    }
}

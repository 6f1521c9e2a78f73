//! Draw submission.
//!
//! The draw callback never touches vertex data. It emits one
//! [`DrawCommand`] per visible ribbon naming the side and vertex window to
//! read; the renderer resolves it against the shared [`crate::StripeBuffers`].

use std::ops::Range;

use crossbeam_channel::Sender;

use crate::emitter::EmitterHandle;
use crate::vertex::MeshType;

/// Fewest vertices that form a drawable strip (one quad).
pub const MIN_STRIP_VERTICES: u32 = 4;

/// One ribbon to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    /// Emitter that owns the ribbon.
    pub emitter: EmitterHandle,
    /// Buffer side to read.
    pub side: usize,
    /// First vertex in the vertex store.
    pub first_vertex: usize,
    /// Vertices over every plane.
    pub vertex_count: usize,
    /// Index of the constant block.
    pub constant_slot: usize,
    /// Strip planes; each plane is `vertex_count / planes` vertices.
    pub planes: usize,
    /// Topology tag.
    pub mesh_type: MeshType,
}

impl DrawCommand {
    /// Vertex window in the vertex store.
    #[inline]
    #[must_use]
    pub const fn vertex_range(&self) -> Range<usize> {
        self.first_vertex..self.first_vertex + self.vertex_count
    }

    /// Vertices of one plane.
    #[inline]
    #[must_use]
    pub const fn plane_vertex_count(&self) -> usize {
        if self.planes == 0 {
            0
        } else {
            self.vertex_count / self.planes
        }
    }
}

/// Result of a draw callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Commands were submitted for this emitter.
    Handled {
        /// Commands submitted.
        commands: usize,
    },
    /// The emitter is drawn through another path.
    NotHandled,
}

/// Receiver of draw commands.
pub trait DrawSink {
    /// Accepts one command.
    fn submit(&mut self, command: DrawCommand);
}

impl DrawSink for Vec<DrawCommand> {
    #[inline]
    fn submit(&mut self, command: DrawCommand) {
        self.push(command);
    }
}

impl DrawSink for Sender<DrawCommand> {
    fn submit(&mut self, command: DrawCommand) {
        if self.send(command).is_err() {
            tracing::debug!(emitter = command.emitter.raw(), "Render thread gone, draw command dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> DrawCommand {
        DrawCommand {
            emitter: EmitterHandle::from_raw(0),
            side: 1,
            first_vertex: 64,
            vertex_count: 24,
            constant_slot: 2,
            planes: 2,
            mesh_type: MeshType::CrossDirect,
        }
    }

    #[test]
    fn test_command_ranges() {
        let cmd = command();
        assert_eq!(cmd.vertex_range(), 64..88);
        assert_eq!(cmd.plane_vertex_count(), 12);
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<DrawCommand> = Vec::new();
        sink.submit(command());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = crossbeam_channel::unbounded();
        tx.submit(command());
        assert_eq!(rx.try_recv().unwrap(), command());

        drop(rx);
        // Disconnected receiver drops silently
        tx.submit(command());
    }
}

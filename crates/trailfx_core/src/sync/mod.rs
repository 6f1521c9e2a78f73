//! # Buffered Hand-off Between Simulation and Render
//!
//! ARCHITECT'S ORDER: One writer. One reader. One index switch.
//!
//! ## The Problem
//!
//! ```text
//! Simulation (tick N+1):  WRITE ribbon vertices
//! Render     (tick N):    READ  ribbon vertices
//!
//! Same memory:   torn meshes on screen
//! One big Mutex: simulation waits for the GPU upload
//! ```
//!
//! ## The Solution: Buffer Sides
//!
//! ```text
//! Double buffering:
//!   tick N    simulation writes side 0, render reads side 1
//!   SWAP
//!   tick N+1  simulation writes side 1, render reads side 0
//!
//! Triple buffering: render reads the side written two ticks ago.
//! Single buffering: no pipelining, writer and reader take turns.
//! ```
//!
//! Each side sits behind its own lock. When the swap protocol is respected
//! the writer and the reader never touch the same side, so the locks are
//! never contended.

mod buffered_store;
mod side;

pub use buffered_store::BufferedStore;
pub use side::{BufferMode, SideCursor};

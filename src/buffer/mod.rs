//! Byte Buffer Module
//!
//! Fixed-capacity, cursor-tracked byte buffer used as the staging area for
//! every byte the store moves to and from its file.
//!
//! ## Cursors
//! ```text
//! 0 <= mark <= position <= limit <= capacity
//!
//! ┌──────────────┬──────────────────┬──────────────────┐
//! │  consumed    │    readable      │  beyond limit    │
//! └──────────────┴──────────────────┴──────────────────┘
//! 0          position             limit          capacity
//! ```
//!
//! Writes advance `position` and may run up to `capacity`; reads advance
//! `position` and stop at `limit`. `flip()` turns a filled buffer into a
//! readable one, `clear()` readies it for writing again.

mod byte_buffer;

use thiserror::Error;

pub use byte_buffer::{ByteBuffer, ByteOrder};

/// Cursor violations reported by [`ByteBuffer`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("buffer overflow: {requested} bytes requested, {available} available")]
    Overflow { requested: usize, available: usize },

    #[error("buffer underflow: {requested} bytes requested, {available} remaining")]
    Underflow { requested: usize, available: usize },

    #[error("buffer mark undefined")]
    MarkUndefined,

    #[error("invalid position {position} (limit {limit})")]
    InvalidPosition { position: usize, limit: usize },

    #[error("invalid limit {limit} (capacity {capacity})")]
    InvalidLimit { limit: usize, capacity: usize },
}

//! Error types for pagekv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::buffer::BufferError;

/// Result type alias using PageKvError
pub type Result<T> = std::result::Result<T, PageKvError>;

/// Unified error type for pagekv operations
#[derive(Debug, Error)]
pub enum PageKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A flush moved fewer bytes than were staged
    #[error("Partial write: expected {expected} bytes, wrote {written}")]
    PartialWrite { expected: usize, written: usize },

    /// An earlier write failed; the file no longer matches the recorded offsets
    #[error("Builder failed earlier: {0}")]
    BuilderFailed(String),

    // -------------------------------------------------------------------------
    // Input Validation Errors (recoverable, caller may retry)
    // -------------------------------------------------------------------------
    #[error("Key too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("Payload too long: {len} bytes (max {max})")]
    PayloadTooLong { len: usize, max: usize },

    #[error("Duplicate key: {0:?}")]
    DuplicateKey(String),

    /// The payload region would grow past what a packed location can address
    #[error("Offset overflow: payload at {offset} exceeds the addressable range")]
    OffsetOverflow { offset: u64 },

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt store: {0}")]
    Corrupt(String),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

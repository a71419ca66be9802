//! Store Module
//!
//! Static, write-once/read-many key-value file with a two-level index.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Payload Region (variable)                               │
//! │   raw payload bytes, in put order                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Leaf Pages (≤ 4096 bytes each, sorted by key)           │
//! │   [KeyLen: u8][Key][Location: u64]                      │
//! │   Location = (payload offset << 24) | payload length    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Upper Directory (variable)                              │
//! │   [PageStart: u64][KeyLen: u8][BoundaryKey]             │
//! │   ... one per page; the last one has no boundary key    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Trailer (8 bytes)                                       │
//! │   DirectoryStart: u64                                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. A page's boundary key is the first key of
//! the page after it, so a query equal to a boundary belongs to the next page.

mod builder;
pub mod format;
mod lookup;
mod shared;

use std::io::{self, ErrorKind, Read, Write};
use std::path::PathBuf;

use crate::buffer::ByteBuffer;
use crate::error::{PageKvError, Result};

pub use builder::Builder;
pub use lookup::Lookup;
pub use shared::SharedLookup;

// =============================================================================
// Store Metadata
// =============================================================================

/// What a closed [`Builder`] produced
#[derive(Debug, Clone)]
pub struct StoreSummary {
    /// Path to the store file
    pub path: PathBuf,
    /// Number of keys reachable through the index
    pub entry_count: usize,
    /// Number of leaf pages
    pub page_count: usize,
    /// Offset of the upper directory (also the trailer value)
    pub directory_offset: u64,
    /// File size in bytes
    pub file_size: u64,
}

// =============================================================================
// Buffer <-> File Helpers (shared by builder and lookup)
// =============================================================================

/// Read until `[position, limit)` of `buf` is full; EOF first is an error
pub(crate) fn fill<R: Read>(buf: &mut ByteBuffer, reader: &mut R) -> io::Result<()> {
    while buf.has_remaining() {
        if buf.read_from(reader)? == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("{} bytes short", buf.remaining()),
            ));
        }
    }
    Ok(())
}

/// Write `[position, limit)` of `buf` out completely
pub(crate) fn drain<W: Write>(buf: &mut ByteBuffer, writer: &mut W) -> Result<()> {
    let expected = buf.remaining();
    let mut written = 0;
    while buf.has_remaining() {
        let n = buf.write_to(writer)?;
        if n == 0 {
            return Err(PageKvError::PartialWrite { expected, written });
        }
        written += n;
    }
    Ok(())
}

//! On-disk format constants and the records shared by builder and lookup.

use crate::buffer::ByteOrder;

// =============================================================================
// Limits
// =============================================================================

/// Longest key a store accepts; key lengths are stored in one byte
pub const MAX_KEY_LENGTH: usize = u8::MAX as usize;

/// Largest single payload (16 MB)
pub const MAX_DATA_LENGTH: usize = 1 << 24;

/// Size of a leaf page of the key directory (4 KB)
pub const PAGE_SIZE: usize = 1 << 12;

/// Low bits of a packed location holding the payload length
pub const DATA_LENGTH_BITS: u32 = 24;

/// Mask selecting the length bits of a packed location
pub const DATA_LENGTH_MASK: u64 = (1 << DATA_LENGTH_BITS) - 1;

/// First payload offset a packed location can no longer address (1 TB)
pub const MAX_OFFSET: u64 = 1 << (64 - DATA_LENGTH_BITS);

/// Trailer: u64 offset of the upper directory
pub const TRAILER_SIZE: usize = 8;

/// Size of a packed location word
pub const LOCATION_SIZE: usize = 8;

/// Largest upper directory record: page offset + key length + key
pub const MAX_DIRECTORY_ENTRY_SIZE: usize = 8 + 1 + MAX_KEY_LENGTH;

/// Byte order of every multi-byte field in the file
pub const FORMAT_BYTE_ORDER: ByteOrder = ByteOrder::LittleEndian;

/// Encoded size of a leaf page triple: key length byte, key, location
pub const fn triple_len(key_len: usize) -> usize {
    1 + key_len + LOCATION_SIZE
}

// =============================================================================
// Records
// =============================================================================

/// Where a payload lives in the store file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: u64,
    pub length: u32,
}

impl Location {
    /// Pack into `(offset << 24) | length`.
    ///
    /// A length of exactly `MAX_DATA_LENGTH` does not fit the 24 length bits
    /// and is stored as 0. Empty payloads are never recorded, so 0 is free.
    pub fn pack(self) -> u64 {
        (self.offset << DATA_LENGTH_BITS) | (u64::from(self.length) & DATA_LENGTH_MASK)
    }

    pub fn unpack(word: u64) -> Self {
        let length = match word & DATA_LENGTH_MASK {
            0 => MAX_DATA_LENGTH as u32,
            n => n as u32,
        };
        Self {
            offset: word >> DATA_LENGTH_BITS,
            length,
        }
    }
}

/// A stored key, kept in memory until the builder is closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub key: String,
    pub location: Location,
}

/// One record of the upper directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirectoryEntry {
    /// Absolute offset of the leaf page
    pub page_start: u64,
    /// First key of the following page; empty for the last page
    pub boundary_key: String,
}

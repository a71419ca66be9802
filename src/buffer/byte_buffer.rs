//! ByteBuffer implementation
//!
//! Slice-backed buffer with position/limit/mark cursors. Wider integers are
//! encoded through `bytes::Buf`/`BufMut` in the buffer's byte order.

use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

use bytes::{Buf, BufMut};

use super::BufferError;

type Result<T> = std::result::Result<T, BufferError>;

/// Byte order used for multi-byte integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The host platform's byte order
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

/// Fixed-size buffer of bytes with cursor-based reads and writes
pub struct ByteBuffer {
    /// Backing storage; its length is the capacity and never changes
    buf: Vec<u8>,
    /// Next index to read or write
    position: usize,
    /// Read ceiling
    limit: usize,
    /// Saved position for `reset()`
    mark: Option<usize>,
    /// Order for u16/u32/u64 accessors
    order: ByteOrder,
}

impl ByteBuffer {
    /// Create a zeroed buffer of the given capacity, ready for writing
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            position: 0,
            limit: capacity,
            mark: None,
            order: ByteOrder::native(),
        }
    }

    /// Wrap existing bytes; the whole content is readable
    pub fn wrap(bytes: Vec<u8>) -> Self {
        let limit = bytes.len();
        Self {
            buf: bytes,
            position: 0,
            limit,
            mark: None,
            order: ByteOrder::native(),
        }
    }

    /// Builder-style byte order selection
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) -> &mut Self {
        self.order = order;
        self
    }

    // =========================================================================
    // Cursors
    // =========================================================================

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Move the position; a mark beyond the new position is discarded
    pub fn set_position(&mut self, position: usize) -> Result<&mut Self> {
        if position > self.limit {
            return Err(BufferError::InvalidPosition {
                position,
                limit: self.limit,
            });
        }
        self.position = position;
        if self.mark.is_some_and(|m| m > position) {
            self.mark = None;
        }
        Ok(self)
    }

    /// Move the limit; position and mark are pulled back inside it
    pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self> {
        if limit > self.capacity() {
            return Err(BufferError::InvalidLimit {
                limit,
                capacity: self.capacity(),
            });
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|m| m > limit) {
            self.mark = None;
        }
        Ok(self)
    }

    pub fn mark(&mut self) -> &mut Self {
        self.mark = Some(self.position);
        self
    }

    /// Return to the marked position
    pub fn reset(&mut self) -> Result<&mut Self> {
        let mark = self.mark.ok_or(BufferError::MarkUndefined)?;
        self.position = mark;
        Ok(self)
    }

    /// Limit to position, position to 0: switch from writing to reading
    pub fn flip(&mut self) -> &mut Self {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
        self
    }

    /// Back to the freshly created state. Content is left untouched.
    pub fn clear(&mut self) -> &mut Self {
        self.position = 0;
        self.limit = self.capacity();
        self.mark = None;
        self
    }

    /// Move the unread bytes to the front and continue writing after them
    pub fn compact(&mut self) -> &mut Self {
        let unread = self.remaining();
        if unread > 0 {
            self.buf.copy_within(self.position..self.limit, 0);
        }
        self.position = unread;
        self.limit = self.capacity();
        self.mark = None;
        self
    }

    /// Position to 0 for a re-read of the same range
    pub fn rewind(&mut self) -> &mut Self {
        self.position = 0;
        self.mark = None;
        self
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    // =========================================================================
    // Writes (bounded by capacity)
    // =========================================================================

    fn writable(&mut self, n: usize) -> Result<&mut [u8]> {
        let available = self.capacity() - self.position;
        if n > available {
            return Err(BufferError::Overflow {
                requested: n,
                available,
            });
        }
        let start = self.position;
        self.position += n;
        Ok(&mut self.buf[start..start + n])
    }

    pub fn put(&mut self, byte: u8) -> Result<&mut Self> {
        self.writable(1)?[0] = byte;
        Ok(self)
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.writable(bytes.len())?.copy_from_slice(bytes);
        Ok(self)
    }

    pub fn put_u16(&mut self, value: u16) -> Result<&mut Self> {
        let order = self.order;
        let mut dst = self.writable(2)?;
        match order {
            ByteOrder::LittleEndian => dst.put_u16_le(value),
            ByteOrder::BigEndian => dst.put_u16(value),
        }
        Ok(self)
    }

    pub fn put_u32(&mut self, value: u32) -> Result<&mut Self> {
        let order = self.order;
        let mut dst = self.writable(4)?;
        match order {
            ByteOrder::LittleEndian => dst.put_u32_le(value),
            ByteOrder::BigEndian => dst.put_u32(value),
        }
        Ok(self)
    }

    pub fn put_u64(&mut self, value: u64) -> Result<&mut Self> {
        let order = self.order;
        let mut dst = self.writable(8)?;
        match order {
            ByteOrder::LittleEndian => dst.put_u64_le(value),
            ByteOrder::BigEndian => dst.put_u64(value),
        }
        Ok(self)
    }

    // =========================================================================
    // Reads (bounded by limit)
    // =========================================================================

    fn readable(&mut self, n: usize) -> Result<&[u8]> {
        let available = self.remaining();
        if n > available {
            return Err(BufferError::Underflow {
                requested: n,
                available,
            });
        }
        let start = self.position;
        self.position += n;
        Ok(&self.buf[start..start + n])
    }

    pub fn get(&mut self) -> Result<u8> {
        Ok(self.readable(1)?[0])
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn get_slice(&mut self, n: usize) -> Result<&[u8]> {
        self.readable(n)
    }

    /// Copy the next `n` bytes out
    pub fn get_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.readable(n)?.to_vec())
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        let order = self.order;
        let mut src = self.readable(2)?;
        Ok(match order {
            ByteOrder::LittleEndian => src.get_u16_le(),
            ByteOrder::BigEndian => src.get_u16(),
        })
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let order = self.order;
        let mut src = self.readable(4)?;
        Ok(match order {
            ByteOrder::LittleEndian => src.get_u32_le(),
            ByteOrder::BigEndian => src.get_u32(),
        })
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        let order = self.order;
        let mut src = self.readable(8)?;
        Ok(match order {
            ByteOrder::LittleEndian => src.get_u64_le(),
            ByteOrder::BigEndian => src.get_u64(),
        })
    }

    // =========================================================================
    // I/O staging
    // =========================================================================

    /// Fill `[position, limit)` with a single read from `reader`.
    ///
    /// Returns the number of bytes read; 0 means end of input or a full
    /// buffer. Interrupted reads are retried.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        if !self.has_remaining() {
            return Ok(0);
        }
        loop {
            match reader.read(&mut self.buf[self.position..self.limit]) {
                Ok(n) => {
                    self.position += n;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Drain `[position, limit)` with a single write to `writer`.
    ///
    /// Returns the number of bytes written. Interrupted writes are retried.
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> io::Result<usize> {
        if !self.has_remaining() {
            return Ok(0);
        }
        loop {
            match writer.write(&self.buf[self.position..self.limit]) {
                Ok(n) => {
                    self.position += n;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("position", &self.position)
            .field("limit", &self.limit)
            .field("capacity", &self.capacity())
            .field("mark", &self.mark)
            .field("order", &self.order)
            .finish()
    }
}

//! Store Builder
//!
//! Appends payloads to a new store file and writes the index on close.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::buffer::ByteBuffer;
use crate::config::{DuplicatePolicy, StoreConfig};
use crate::error::{PageKvError, Result};

use super::format::{
    triple_len, DirectoryEntry, Entry, Location, FORMAT_BYTE_ORDER, MAX_DATA_LENGTH,
    MAX_DIRECTORY_ENTRY_SIZE, MAX_KEY_LENGTH, MAX_OFFSET, PAGE_SIZE, TRAILER_SIZE,
};
use super::{drain, StoreSummary};

/// Builds a store file: `put` payloads in any order, then `close`.
///
/// Not meant to be shared between threads; every method takes `&mut self`.
pub struct Builder {
    /// Output file path
    path: PathBuf,
    /// Output file, released when the builder is dropped
    file: File,
    /// Staging buffer for everything written to `file`
    buf: ByteBuffer,
    /// Recorded keys, unsorted until close
    entries: Vec<Entry>,
    /// Keys seen so far, only tracked under `DuplicatePolicy::Reject`
    seen: HashSet<String>,
    /// Logical write position (file length once `buf` is flushed)
    cursor: u64,
    config: StoreConfig,
    /// Set once `close` ran, successful or not
    finished: bool,
    /// First write error; every later `put` and `close` reports it
    failure: Option<String>,
}

impl Builder {
    /// Create (or truncate) a store file with the default config
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(path, StoreConfig::default())
    }

    /// Create (or truncate) a store file
    pub fn with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        debug!(path = %path.display(), ?config, "store builder created");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            buf: ByteBuffer::new(config.data_buffer_capacity),
            entries: Vec::new(),
            seen: HashSet::new(),
            cursor: 0,
            config,
            finished: false,
            failure: None,
        })
    }

    pub fn underlying_path(&self) -> &Path {
        &self.path
    }

    /// Number of recorded puts (duplicates included)
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Payload bytes accepted so far
    pub fn bytes_written(&self) -> u64 {
        self.cursor
    }

    /// Store `payload` under `key` and return the number of payload bytes.
    ///
    /// An empty payload writes nothing and records nothing: the key stays
    /// absent from the finished store.
    ///
    /// Once a write to the file fails, the builder is unusable: this and
    /// every later call returns [`PageKvError::BuilderFailed`].
    pub fn put(&mut self, key: &str, payload: &[u8]) -> Result<usize> {
        self.ensure_usable()?;
        if key.len() > MAX_KEY_LENGTH {
            return Err(PageKvError::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LENGTH,
            });
        }
        if payload.len() > MAX_DATA_LENGTH {
            return Err(PageKvError::PayloadTooLong {
                len: payload.len(),
                max: MAX_DATA_LENGTH,
            });
        }
        if payload.is_empty() {
            return Ok(0);
        }

        let reject_duplicates = self.config.duplicate_policy == DuplicatePolicy::Reject;
        if reject_duplicates && self.seen.contains(key) {
            return Err(PageKvError::DuplicateKey(key.to_string()));
        }

        let offset = self.cursor;
        if offset + payload.len() as u64 > MAX_OFFSET {
            return Err(PageKvError::OffsetOverflow { offset });
        }

        let staged = self.stage(payload);
        self.record_failure(staged)?;

        if reject_duplicates {
            self.seen.insert(key.to_string());
        }
        self.entries.push(Entry {
            key: key.to_string(),
            location: Location {
                offset,
                length: payload.len() as u32,
            },
        });

        Ok(payload.len())
    }

    /// Write the index and trailer, then release the file.
    ///
    /// The file handle is closed whether or not finalizing succeeds; on error
    /// the file is not a usable store.
    pub fn close(mut self) -> Result<StoreSummary> {
        let outcome = self.finalize();
        self.finished = true;

        match &outcome {
            Ok(summary) => info!(
                path = %summary.path.display(),
                entries = summary.entry_count,
                pages = summary.page_count,
                bytes = summary.file_size,
                "store closed"
            ),
            Err(e) => error!(path = %self.path.display(), error = %e, "store finalize failed"),
        }

        outcome
    }

    // =========================================================================
    // Finalize
    // =========================================================================

    fn finalize(&mut self) -> Result<StoreSummary> {
        self.ensure_usable()?;
        let entries = self.sorted_entries();
        let (directory, directory_offset) = self.write_pages(&entries)?;
        self.write_directory(&directory)?;

        let mut trailer = ByteBuffer::new(TRAILER_SIZE).with_order(FORMAT_BYTE_ORDER);
        trailer.put_u64(directory_offset)?;
        self.stage_buffer(&mut trailer)?;
        self.flush()?;

        if self.config.sync_on_close {
            self.file.sync_all()?;
        }

        Ok(StoreSummary {
            path: self.path.clone(),
            entry_count: entries.len(),
            page_count: directory.len(),
            directory_offset,
            file_size: self.file.metadata()?.len(),
        })
    }

    /// Stable sort by key, then collapse duplicate runs per the policy
    fn sorted_entries(&mut self) -> Vec<Entry> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let recorded = entries.len();
        let keep_last = self.config.duplicate_policy == DuplicatePolicy::KeepLast;
        let mut kept: Vec<Entry> = Vec::with_capacity(recorded);
        for entry in entries {
            match kept.last_mut() {
                Some(last) if last.key == entry.key => {
                    if keep_last {
                        *last = entry;
                    }
                }
                _ => kept.push(entry),
            }
        }

        if kept.len() < recorded {
            debug!(
                dropped = recorded - kept.len(),
                policy = ?self.config.duplicate_policy,
                "collapsed duplicate keys"
            );
        }
        kept
    }

    /// Stream sorted entries into leaf pages; returns the upper directory and
    /// the offset it will be written at.
    fn write_pages(&mut self, entries: &[Entry]) -> Result<(Vec<DirectoryEntry>, u64)> {
        let mut page = ByteBuffer::new(PAGE_SIZE).with_order(FORMAT_BYTE_ORDER);
        let mut directory = Vec::new();
        let mut page_start = self.cursor;

        for entry in entries {
            if page.remaining() < triple_len(entry.key.len()) {
                debug!(
                    page = directory.len(),
                    offset = page_start,
                    bytes = page.position(),
                    boundary = %entry.key,
                    "sealing leaf page"
                );
                self.stage_buffer(&mut page)?;
                directory.push(DirectoryEntry {
                    page_start,
                    boundary_key: entry.key.clone(),
                });
                page_start = self.cursor;
            }
            page.put(entry.key.len() as u8)?
                .put_slice(entry.key.as_bytes())?
                .put_u64(entry.location.pack())?;
        }

        if page.position() > 0 {
            self.stage_buffer(&mut page)?;
        }

        let directory_offset = self.cursor;
        if directory_offset > page_start {
            directory.push(DirectoryEntry {
                page_start,
                boundary_key: String::new(),
            });
        }

        Ok((directory, directory_offset))
    }

    fn write_directory(&mut self, directory: &[DirectoryEntry]) -> Result<()> {
        let mut record = ByteBuffer::new(MAX_DIRECTORY_ENTRY_SIZE).with_order(FORMAT_BYTE_ORDER);
        for entry in directory {
            record.put_u64(entry.page_start)?;
            if !entry.boundary_key.is_empty() {
                record
                    .put(entry.boundary_key.len() as u8)?
                    .put_slice(entry.boundary_key.as_bytes())?;
            }
            self.stage_buffer(&mut record)?;
        }
        Ok(())
    }

    // =========================================================================
    // Failure Tracking
    // =========================================================================

    fn ensure_usable(&self) -> Result<()> {
        match &self.failure {
            Some(cause) => Err(PageKvError::BuilderFailed(cause.clone())),
            None => Ok(()),
        }
    }

    /// Remember the first write error. Staged bytes may be lost, so the
    /// cursor and recorded offsets can no longer be trusted.
    fn record_failure<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if let Err(e) = &outcome {
            if self.failure.is_none() {
                error!(path = %self.path.display(), error = %e, "store write failed");
                self.failure = Some(e.to_string());
            }
        }
        outcome
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Flip `src`, append its content to the staging buffer, clear it
    fn stage_buffer(&mut self, src: &mut ByteBuffer) -> Result<()> {
        src.flip();
        let outcome = src
            .get_slice(src.remaining())
            .map_err(PageKvError::from)
            .and_then(|bytes| self.stage(bytes));
        src.clear();
        outcome
    }

    /// Append bytes, flushing first when the staging buffer can't take them
    fn stage(&mut self, bytes: &[u8]) -> Result<()> {
        if self.buf.remaining() < bytes.len() {
            self.flush()?;
        }
        if bytes.len() > self.buf.capacity() {
            self.write_through(bytes)?;
        } else {
            self.buf.put_slice(bytes)?;
        }
        self.cursor += bytes.len() as u64;
        Ok(())
    }

    /// Flip, write, clear
    fn flush(&mut self) -> Result<()> {
        self.buf.flip();
        let outcome = drain(&mut self.buf, &mut self.file);
        self.buf.clear();
        outcome
    }

    fn write_through(&mut self, bytes: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < bytes.len() {
            match self.file.write(&bytes[written..]) {
                Ok(0) => {
                    return Err(PageKvError::PartialWrite {
                        expected: bytes.len(),
                        written,
                    })
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl Drop for Builder {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                path = %self.path.display(),
                "store builder dropped without close; file is not a valid store"
            );
        }
    }
}

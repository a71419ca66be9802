//! Store Lookup
//!
//! Opens a finished store file and resolves keys: binary search over the
//! in-memory upper directory, one leaf page loaded on demand, linear scan.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::buffer::{BufferError, ByteBuffer};
use crate::error::{PageKvError, Result};

use super::fill;
use super::format::{
    triple_len, Location, FORMAT_BYTE_ORDER, MAX_DIRECTORY_ENTRY_SIZE, PAGE_SIZE, TRAILER_SIZE,
};

/// Smallest leaf page entry: empty key
const MIN_TRIPLE_SIZE: u64 = triple_len(0) as u64;

/// Read handle for a store file.
///
/// Holds the upper directory for its whole lifetime and caches the most
/// recently loaded leaf page. Queries take `&mut self`; use
/// [`super::SharedLookup`] to query from several threads.
pub struct Lookup {
    /// Store file path
    path: PathBuf,
    /// File handle for page and payload reads
    file: File,
    /// Page start offsets, followed by the directory offset as end guard
    offsets: Vec<u64>,
    /// Boundary keys: `keys[i]` is the first key of page `i + 1`
    keys: Vec<String>,
    /// Index of the page currently held in `page`
    cached_page: Option<usize>,
    /// Scratch buffer holding the cached page
    page: ByteBuffer,
}

impl Lookup {
    /// Open a store file and load its upper directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < TRAILER_SIZE as u64 {
            return Err(PageKvError::Corrupt(format!(
                "file is {} bytes, shorter than the {}-byte trailer",
                file_size, TRAILER_SIZE
            )));
        }

        // Trailer: where the upper directory starts
        let trailer_offset = file_size - TRAILER_SIZE as u64;
        file.seek(SeekFrom::Start(trailer_offset))?;
        let mut trailer = ByteBuffer::new(TRAILER_SIZE).with_order(FORMAT_BYTE_ORDER);
        fill(&mut trailer, &mut file)?;
        let directory_offset = trailer.flip().get_u64()?;

        if directory_offset > trailer_offset {
            return Err(PageKvError::Corrupt(format!(
                "directory offset {} beyond trailer at {}",
                directory_offset, trailer_offset
            )));
        }

        // Upper directory, read fully. Every page holds at least one triple,
        // which bounds how many directory entries the pages can account for.
        let directory_len = trailer_offset - directory_offset;
        let max_directory_len = (directory_offset / MIN_TRIPLE_SIZE + 1)
            .saturating_mul(MAX_DIRECTORY_ENTRY_SIZE as u64);
        if directory_len > max_directory_len {
            return Err(PageKvError::Corrupt(format!(
                "directory of {} bytes too large for {} bytes of data and pages",
                directory_len, directory_offset
            )));
        }
        let directory_len = directory_len as usize;
        let mut directory = ByteBuffer::new(directory_len).with_order(FORMAT_BYTE_ORDER);
        file.seek(SeekFrom::Start(directory_offset))?;
        fill(&mut directory, &mut file)?;
        directory.flip();

        let (offsets, keys) = parse_directory(&mut directory, directory_offset)?;

        info!(
            path = %path.display(),
            pages = offsets.len() - 1,
            directory_offset,
            "store opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            offsets,
            keys,
            cached_page: None,
            page: ByteBuffer::new(PAGE_SIZE).with_order(FORMAT_BYTE_ORDER),
        })
    }

    pub fn underlying_path(&self) -> &Path {
        &self.path
    }

    /// Number of leaf pages
    pub fn page_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Offset of the upper directory, i.e. the end of the leaf pages
    pub fn directory_offset(&self) -> u64 {
        self.offsets[self.offsets.len() - 1]
    }

    /// Separator keys of the upper directory, one per page after the first
    pub fn boundary_keys(&self) -> &[String] {
        &self.keys
    }

    /// Start offset of every leaf page, in key order
    pub fn page_offsets(&self) -> &[u64] {
        &self.offsets[..self.page_count()]
    }

    /// Get the payload stored under `key`
    ///
    /// Returns:
    /// - `Ok(Some(payload))`: key found
    /// - `Ok(None)`: key not in this store
    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.locate(key)? {
            Some(location) => self.read_payload(location).map(Some),
            None => Ok(None),
        }
    }

    pub fn contains(&mut self, key: &str) -> Result<bool> {
        Ok(self.locate(key)?.is_some())
    }

    /// Release the file handle
    pub fn close(self) -> Result<()> {
        debug!(path = %self.path.display(), "store lookup closed");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Load the page that would hold `key` and find its location there
    fn locate(&mut self, key: &str) -> Result<Option<Location>> {
        if self.page_count() == 0 {
            return Ok(None);
        }

        let idx = self.page_index(key);
        if self.cached_page != Some(idx) {
            self.load_page(idx)?;
        }
        self.scan_page(key.as_bytes())
    }

    /// Page that would hold `key`. A key equal to a boundary is the first
    /// key of the next page.
    fn page_index(&self, key: &str) -> usize {
        let idx = self.keys.partition_point(|k| k.as_str() < key);
        if idx < self.keys.len() && self.keys[idx] == key {
            idx + 1
        } else {
            idx
        }
    }

    fn load_page(&mut self, idx: usize) -> Result<()> {
        let start = self.offsets[idx];
        let len = (self.offsets[idx + 1] - start) as usize;

        self.cached_page = None;
        self.file.seek(SeekFrom::Start(start))?;
        self.page.clear().set_limit(len)?;
        fill(&mut self.page, &mut self.file)?;
        self.page.flip();
        self.cached_page = Some(idx);

        trace!(page = idx, offset = start, bytes = len, "leaf page loaded");
        Ok(())
    }

    /// Scan the cached page from its start for `key`
    fn scan_page(&mut self, key: &[u8]) -> Result<Option<Location>> {
        self.page.rewind();
        while self.page.has_remaining() {
            let key_len = self.page.get()? as usize;
            let matched = self.page.get_slice(key_len)? == key;
            let word = self.page.get_u64()?;
            if matched {
                return Ok(Some(Location::unpack(word)));
            }
        }
        Ok(None)
    }

    fn read_payload(&mut self, location: Location) -> Result<Vec<u8>> {
        let end = location.offset + u64::from(location.length);
        if end > self.offsets[0] {
            return Err(PageKvError::Corrupt(format!(
                "payload [{}, {}) overlaps the index at {}",
                location.offset, end, self.offsets[0]
            )));
        }

        self.file.seek(SeekFrom::Start(location.offset))?;
        let mut payload = vec![0u8; location.length as usize];
        self.file.read_exact(&mut payload)?;
        Ok(payload)
    }
}

/// Split the upper directory into page offsets (plus guard) and boundary keys
fn parse_directory(
    directory: &mut ByteBuffer,
    directory_offset: u64,
) -> Result<(Vec<u64>, Vec<String>)> {
    let corrupt = |e: BufferError| PageKvError::Corrupt(format!("truncated directory: {}", e));

    let mut offsets = Vec::new();
    let mut keys = Vec::new();
    while directory.has_remaining() {
        offsets.push(directory.get_u64().map_err(corrupt)?);
        if directory.has_remaining() {
            let key_len = directory.get().map_err(corrupt)? as usize;
            let key = directory.get_vec(key_len).map_err(corrupt)?;
            let key = String::from_utf8(key).map_err(|e| {
                PageKvError::Corrupt(format!("boundary key is not UTF-8: {}", e))
            })?;
            keys.push(key);
        }
    }
    offsets.push(directory_offset);

    let pages = offsets.len() - 1;
    if pages > 0 && keys.len() + 1 != pages {
        return Err(PageKvError::Corrupt(format!(
            "{} pages but {} boundary keys",
            pages,
            keys.len()
        )));
    }
    for pair in offsets.windows(2) {
        if pair[0] > pair[1] || pair[1] - pair[0] > PAGE_SIZE as u64 {
            return Err(PageKvError::Corrupt(format!(
                "bad page span [{}, {})",
                pair[0], pair[1]
            )));
        }
    }
    if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(PageKvError::Corrupt(
            "boundary keys not strictly ascending".to_string(),
        ));
    }

    Ok((offsets, keys))
}

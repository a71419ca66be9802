//! Thread-safe lookup handle.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

use super::Lookup;

/// A [`Lookup`] behind a mutex, for querying one store from many threads.
///
/// Each query holds the lock for its page load, scan and payload read, so
/// queries are serialized but never observe a half-loaded page.
pub struct SharedLookup {
    path: PathBuf,
    inner: Mutex<Lookup>,
}

impl SharedLookup {
    /// Open a store file for shared reads
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Lookup::open(path).map(Self::new)
    }

    pub fn new(lookup: Lookup) -> Self {
        Self {
            path: lookup.underlying_path().to_path_buf(),
            inner: Mutex::new(lookup),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.lock().get(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        self.inner.lock().contains(key)
    }

    pub fn underlying_path(&self) -> &Path {
        &self.path
    }

    /// Take back the single-threaded handle
    pub fn into_inner(self) -> Lookup {
        self.inner.into_inner()
    }

    /// Release the file handle
    pub fn close(self) -> Result<()> {
        self.into_inner().close()
    }
}

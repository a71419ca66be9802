//! Configuration for pagekv
//!
//! Build-side knobs with sensible defaults. The on-disk format itself is fixed
//! (see [`crate::store::format`]) and never depends on these values.

use crate::store::format::MAX_DATA_LENGTH;

/// Configuration for a [`crate::Builder`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Write Path Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the staging buffer payloads are appended to before
    /// they hit the file. Payloads larger than this bypass the buffer.
    pub data_buffer_capacity: usize,

    /// What `put` and `close` do with a key that was already stored
    pub duplicate_policy: DuplicatePolicy,

    /// fsync the store file before the builder releases it
    pub sync_on_close: bool,
}

/// Policy for repeated `put` calls with the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The most recent payload wins
    #[default]
    KeepLast,

    /// The first payload wins; later ones are dead space in the file
    KeepFirst,

    /// A repeated key fails the `put` with `DuplicateKey`
    Reject,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_buffer_capacity: MAX_DATA_LENGTH, // 16 MB
            duplicate_policy: DuplicatePolicy::default(),
            sync_on_close: false,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the payload staging buffer capacity (in bytes, at least 1)
    pub fn data_buffer_capacity(mut self, size: usize) -> Self {
        self.config.data_buffer_capacity = size.max(1);
        self
    }

    /// Set the duplicate key policy
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Enable or disable fsync on close
    pub fn sync_on_close(mut self, sync: bool) -> Self {
        self.config.sync_on_close = sync;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}

//! # pagekv
//!
//! A static, write-once/read-many key-value file store:
//! - Payloads appended under string keys by a single [`Builder`]
//! - Two-level sorted index (upper directory + 4 KB leaf pages) written on close
//! - Point lookups with one binary search, at most one page read and one
//!   payload read per query
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Builder                               │
//! │        put(key, payload) ... close() (write once)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  store file
//!                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ [payloads][leaf pages][upper directory][trailer]             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │   Lookup    │          │ SharedLookup │
//!   │ (one thread)│          │   (Mutex)    │
//!   └─────────────┘          └──────────────┘
//! ```
//!
//! ```no_run
//! use pagekv::{Builder, Lookup};
//!
//! # fn main() -> pagekv::Result<()> {
//! let mut builder = Builder::create("fruits.db")?;
//! builder.put("apple", b"red")?;
//! builder.put("banana", b"yellow")?;
//! builder.close()?;
//!
//! let mut lookup = Lookup::open("fruits.db")?;
//! assert_eq!(lookup.get("banana")?, Some(b"yellow".to_vec()));
//! assert_eq!(lookup.get("cherry")?, None);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod buffer;
pub mod config;
pub mod error;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{DuplicatePolicy, StoreConfig};
pub use error::{PageKvError, Result};
pub use store::format::{MAX_DATA_LENGTH, MAX_KEY_LENGTH, PAGE_SIZE};
pub use store::{Builder, Lookup, SharedLookup, StoreSummary};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pagekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Tests for the store lookup
//!
//! These tests verify:
//! - Point lookups across one and many leaf pages
//! - Not-found results for absent keys (not errors)
//! - Boundary keys resolving to the following page
//! - Duplicate key policies
//! - Rejection of malformed files

use std::fs;
use std::path::PathBuf;

use pagekv::{Builder, DuplicatePolicy, Lookup, PageKvError, StoreConfig, MAX_DATA_LENGTH};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.db");
    (temp_dir, path)
}

fn build_store(path: &PathBuf, entries: &[(&str, &str)]) {
    let mut builder = Builder::create(path).unwrap();
    for (key, payload) in entries {
        builder.put(key, payload.as_bytes()).unwrap();
    }
    builder.close().unwrap();
}

/// Deterministic payload for entry `i`
fn payload_for(i: usize) -> Vec<u8> {
    vec![(i % 251) as u8; (i * 37) % 5000 + 1]
}

// =============================================================================
// Basic Lookup Tests
// =============================================================================

#[test]
fn test_get_existing_keys() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("a", "1"), ("b", "22"), ("c", "333")]);

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("b").unwrap(), Some(b"22".to_vec()));
    assert_eq!(lookup.get("a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(lookup.get("c").unwrap(), Some(b"333".to_vec()));
}

#[test]
fn test_get_missing_key_is_not_an_error() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("b", "1"), ("d", "2")]);

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("a").unwrap(), None); // before first
    assert_eq!(lookup.get("c").unwrap(), None); // between
    assert_eq!(lookup.get("z").unwrap(), None); // after last
    assert_eq!(lookup.get("").unwrap(), None);
    assert!(!lookup.contains("c").unwrap());
    assert!(lookup.contains("d").unwrap());
}

#[test]
fn test_get_is_idempotent() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("key", "payload"), ("other", "x")]);
    let before = fs::read(&path).unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    let first = lookup.get("key").unwrap();
    let second = lookup.get("key").unwrap();

    assert_eq!(first, Some(b"payload".to_vec()));
    assert_eq!(first, second);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_zero_length_payload_is_absent() {
    let (_temp, path) = setup_temp_store();

    let mut builder = Builder::create(&path).unwrap();
    assert_eq!(builder.put("empty", b"").unwrap(), 0);
    builder.put("full", b"data").unwrap();
    builder.close().unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("empty").unwrap(), None);
    assert_eq!(lookup.get("full").unwrap(), Some(b"data".to_vec()));
}

#[test]
fn test_empty_store() {
    let (_temp, path) = setup_temp_store();
    Builder::create(&path).unwrap().close().unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.page_count(), 0);
    assert_eq!(lookup.directory_offset(), 0);
    assert_eq!(lookup.get("anything").unwrap(), None);
    assert!(!lookup.contains("anything").unwrap());
}

#[test]
fn test_empty_key_round_trip() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("", "root"), ("a", "leaf")]);

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("").unwrap(), Some(b"root".to_vec()));
    assert_eq!(lookup.get("a").unwrap(), Some(b"leaf".to_vec()));
}

#[test]
fn test_underlying_path_and_close() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("a", "1")]);

    let lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.underlying_path(), path.as_path());
    lookup.close().unwrap();
}

// =============================================================================
// Multi-Page Tests
// =============================================================================

#[test]
fn test_round_trip_many_pages() {
    let (_temp, path) = setup_temp_store();
    let keys: Vec<String> = (0..3000)
        .map(|i| format!("{}{}", "z".repeat(i % 50), i))
        .collect();

    let mut builder = Builder::create(&path).unwrap();
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(builder.put(key, &payload_for(i)).unwrap(), payload_for(i).len());
    }
    builder.close().unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    assert!(lookup.page_count() > 1);

    // Put order, then reverse: every query may switch pages
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(lookup.get(key).unwrap(), Some(payload_for(i)), "key {}", key);
    }
    for (i, key) in keys.iter().enumerate().rev() {
        assert_eq!(lookup.get(key).unwrap(), Some(payload_for(i)), "key {}", key);
    }
    assert_eq!(lookup.get("zz").unwrap(), None);
    assert_eq!(lookup.get("~").unwrap(), None);
}

#[test]
fn test_boundary_key_resolves_to_next_page() {
    let (_temp, path) = setup_temp_store();

    let mut builder = Builder::create(&path).unwrap();
    for i in 0..400 {
        builder.put(&format!("{:03}", i), format!("v{}", i).as_bytes()).unwrap();
    }
    builder.close().unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.boundary_keys(), &["341".to_string()]);

    assert_eq!(lookup.get("340").unwrap(), Some(b"v340".to_vec()));
    assert_eq!(lookup.get("341").unwrap(), Some(b"v341".to_vec()));
    assert_eq!(lookup.get("342").unwrap(), Some(b"v342".to_vec()));
    assert_eq!(lookup.get("000").unwrap(), Some(b"v0".to_vec()));
    assert_eq!(lookup.get("399").unwrap(), Some(b"v399".to_vec()));
    // Absent keys on either side of the boundary
    assert_eq!(lookup.get("3405").unwrap(), None);
    assert_eq!(lookup.get("3415").unwrap(), None);
}

#[test]
fn test_payload_larger_than_staging_buffer() {
    let (_temp, path) = setup_temp_store();
    let config = StoreConfig::builder().data_buffer_capacity(16).build();

    let big = (0..10_000u32).map(|i| (i % 256) as u8).collect::<Vec<u8>>();
    let mut builder = Builder::with_config(&path, config).unwrap();
    builder.put("small", b"tiny").unwrap();
    builder.put("big", &big).unwrap();
    builder.put("after", b"tail").unwrap();
    builder.close().unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("big").unwrap(), Some(big));
    assert_eq!(lookup.get("small").unwrap(), Some(b"tiny".to_vec()));
    assert_eq!(lookup.get("after").unwrap(), Some(b"tail".to_vec()));
}

#[test]
fn test_max_length_payload_round_trip() {
    let (_temp, path) = setup_temp_store();
    let mut payload = vec![0xabu8; MAX_DATA_LENGTH];
    payload[0] = 1;
    payload[MAX_DATA_LENGTH - 1] = 2;

    let mut builder = Builder::create(&path).unwrap();
    builder.put("before", b"b").unwrap();
    assert_eq!(builder.put("max", &payload).unwrap(), MAX_DATA_LENGTH);
    builder.put("next", b"n").unwrap();
    builder.close().unwrap();

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("max").unwrap(), Some(payload));
    assert_eq!(lookup.get("before").unwrap(), Some(b"b".to_vec()));
    assert_eq!(lookup.get("next").unwrap(), Some(b"n".to_vec()));
}

// =============================================================================
// Duplicate Key Tests
// =============================================================================

#[test]
fn test_duplicates_keep_last_by_default() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("k", "one"), ("j", "x"), ("k", "two"), ("k", "three")]);

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("k").unwrap(), Some(b"three".to_vec()));
    assert_eq!(lookup.get("j").unwrap(), Some(b"x".to_vec()));
}

#[test]
fn test_duplicates_keep_first() {
    let (_temp, path) = setup_temp_store();
    let config = StoreConfig::builder()
        .duplicate_policy(DuplicatePolicy::KeepFirst)
        .build();

    let mut builder = Builder::with_config(&path, config).unwrap();
    builder.put("k", b"one").unwrap();
    builder.put("k", b"two").unwrap();
    let summary = builder.close().unwrap();
    assert_eq!(summary.entry_count, 1);

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("k").unwrap(), Some(b"one".to_vec()));
}

#[test]
fn test_duplicates_never_straddle_pages() {
    let (_temp, path) = setup_temp_store();

    // Enough copies of one key to fill several pages if they were kept
    let mut builder = Builder::create(&path).unwrap();
    for i in 0..1000 {
        builder.put("same", format!("{}", i).as_bytes()).unwrap();
    }
    builder.put("other", b"o").unwrap();
    let summary = builder.close().unwrap();
    assert_eq!(summary.entry_count, 2);
    assert_eq!(summary.page_count, 1);

    let mut lookup = Lookup::open(&path).unwrap();
    assert_eq!(lookup.get("same").unwrap(), Some(b"999".to_vec()));
}

// =============================================================================
// Malformed File Tests
// =============================================================================

#[test]
fn test_open_missing_file() {
    let (temp, _path) = setup_temp_store();
    let result = Lookup::open(temp.path().join("nope.db"));
    assert!(matches!(result, Err(PageKvError::Io(_))));
}

#[test]
fn test_open_file_shorter_than_trailer() {
    let (_temp, path) = setup_temp_store();
    fs::write(&path, b"abc").unwrap();

    assert!(matches!(Lookup::open(&path), Err(PageKvError::Corrupt(_))));
}

#[test]
fn test_open_trailer_past_end() {
    let (_temp, path) = setup_temp_store();
    let mut bytes = vec![0u8; 16];
    bytes[8..].copy_from_slice(&1000u64.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    assert!(matches!(Lookup::open(&path), Err(PageKvError::Corrupt(_))));
}

#[test]
fn test_open_truncated_directory() {
    let (_temp, path) = setup_temp_store();
    build_store(&path, &[("a", "1")]);

    // Drop the last directory byte and rewrite the trailer
    let mut bytes = fs::read(&path).unwrap();
    let len = bytes.len();
    let directory_offset = u64::from_le_bytes(bytes[len - 8..].try_into().unwrap());
    bytes.truncate(len - 9);
    bytes.extend_from_slice(&directory_offset.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    assert!(matches!(Lookup::open(&path), Err(PageKvError::Corrupt(_))));
}

#[test]
fn test_open_oversized_directory() {
    let (_temp, path) = setup_temp_store();

    // Large non-store file whose trailer claims the directory starts at 0
    fs::write(&path, vec![0u8; 100_000]).unwrap();

    match Lookup::open(&path) {
        Err(PageKvError::Corrupt(msg)) => assert!(msg.contains("too large"), "{}", msg),
        other => panic!("expected Corrupt, got {:?}", other.map(|_| ())),
    }
}

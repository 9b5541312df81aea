//! SQLite cache store tests for datacore-store-sqlite.
// crates/datacore-store-sqlite/tests/sqlite_cache.rs
// =============================================================================
// Module: SQLite Cache Tests
// Description: Persistence, schema reset, read-only handles, refresh mark.
// Purpose: Ensure the shared cache survives restarts and never regresses.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use datacore_core::CacheError;
use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::EncodingTag;
use datacore_core::Timestamp;
use datacore_store_sqlite::MAX_ENTRY_BYTES;
use datacore_store_sqlite::SchemaStatus;
use datacore_store_sqlite::SqliteCacheConfig;
use datacore_store_sqlite::SqliteCacheStore;
use proptest::prelude::*;
use rusqlite::Connection;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> SqliteCacheStore {
    SqliteCacheStore::open(&SqliteCacheConfig::new(dir.path().join("cache.sqlite"))).unwrap()
}

#[test]
fn put_then_get_returns_bytes() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert_eq!(store.schema_status(), SchemaStatus::Created);
    let bytes = br#"{"vehicles":[]}"#;
    store.put(CacheKey::FleetStatus, bytes, Timestamp::from_unix_millis(1_000)).unwrap();

    let item = store.get(CacheKey::FleetStatus).unwrap().expect("entry present");
    assert_eq!(item.bytes, bytes.to_vec());
    assert_eq!(item.encoding, EncodingTag::Json);
    assert_eq!(item.written_at, Timestamp::from_unix_millis(1_000));
    assert!(store.get(CacheKey::FuelStats).unwrap().is_none());
}

#[test]
fn put_replaces_previous_value() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.put(CacheKey::Vehicles, b"[1]", Timestamp::from_unix_millis(1)).unwrap();
    store.put(CacheKey::Vehicles, b"[2]", Timestamp::from_unix_millis(2)).unwrap();
    let item = store.get(CacheKey::Vehicles).unwrap().unwrap();
    assert_eq!(item.bytes, b"[2]".to_vec());
    assert_eq!(item.written_at.as_unix_millis(), 2);
}

#[test]
fn clear_removes_single_key() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.put(CacheKey::Vehicles, b"[]", Timestamp::from_unix_millis(1)).unwrap();
    store.put(CacheKey::FuelStats, b"{}", Timestamp::from_unix_millis(1)).unwrap();
    store.clear(CacheKey::Vehicles).unwrap();
    assert!(store.get(CacheKey::Vehicles).unwrap().is_none());
    assert!(store.get(CacheKey::FuelStats).unwrap().is_some());
}

#[test]
fn entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        store.put(CacheKey::WorkHours, b"{\"year\":2026}", Timestamp::from_unix_millis(5)).unwrap();
        store.set_refresh_mark(Timestamp::from_unix_millis(5)).unwrap();
    }
    let store = open_store(&dir);
    assert_eq!(store.schema_status(), SchemaStatus::Opened);
    assert!(store.get(CacheKey::WorkHours).unwrap().is_some());
    assert_eq!(store.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(5)));
}

#[test]
fn refresh_mark_never_moves_backward() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert_eq!(store.refresh_mark().unwrap(), None);
    store.set_refresh_mark(Timestamp::from_unix_millis(200)).unwrap();
    store.set_refresh_mark(Timestamp::from_unix_millis(100)).unwrap();
    assert_eq!(store.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(200)));
    store.set_refresh_mark(Timestamp::from_unix_millis(300)).unwrap();
    assert_eq!(store.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(300)));
}

#[test]
fn oversized_entry_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let bytes = vec![b'x'; MAX_ENTRY_BYTES + 1];
    let err = store.put(CacheKey::Vehicles, &bytes, Timestamp::from_unix_millis(1)).unwrap_err();
    assert!(matches!(err, CacheError::Store(message) if message.contains("size limit")));
    assert!(store.get(CacheKey::Vehicles).unwrap().is_none());
}

#[test]
fn version_mismatch_resets_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.sqlite");
    {
        let store = SqliteCacheStore::open(&SqliteCacheConfig::new(&path)).unwrap();
        store.put(CacheKey::Vehicles, b"[]", Timestamp::from_unix_millis(1)).unwrap();
    }
    {
        let connection = Connection::open(&path).unwrap();
        connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    }
    let store = SqliteCacheStore::open(&SqliteCacheConfig::new(&path)).unwrap();
    assert_eq!(store.schema_status(), SchemaStatus::Reset);
    assert!(store.get(CacheKey::Vehicles).unwrap().is_none());
    assert_eq!(store.refresh_mark().unwrap(), None);
}

#[test]
fn unknown_encoding_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.sqlite");
    let store = SqliteCacheStore::open(&SqliteCacheConfig::new(&path)).unwrap();
    store.put(CacheKey::Vehicles, b"[]", Timestamp::from_unix_millis(1)).unwrap();
    {
        let connection = Connection::open(&path).unwrap();
        connection.execute("UPDATE cache_entries SET encoding = 'plist'", []).unwrap();
    }
    assert!(store.get(CacheKey::Vehicles).unwrap().is_none());
}

#[test]
fn read_only_handle_reads_but_never_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.sqlite");
    let writer = SqliteCacheStore::open(&SqliteCacheConfig::new(&path)).unwrap();
    writer.put(CacheKey::NextLaunch, b"{}", Timestamp::from_unix_millis(7)).unwrap();
    writer.set_refresh_mark(Timestamp::from_unix_millis(7)).unwrap();

    let reader = SqliteCacheStore::open_read_only(&path).unwrap();
    assert!(!reader.is_writable());
    assert!(reader.get(CacheKey::NextLaunch).unwrap().is_some());
    assert_eq!(reader.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(7)));
    let err = reader.put(CacheKey::NextLaunch, b"{}", Timestamp::from_unix_millis(8)).unwrap_err();
    assert!(matches!(err, CacheError::ReadOnly));
    assert!(matches!(reader.clear(CacheKey::NextLaunch), Err(CacheError::ReadOnly)));
    assert!(matches!(
        reader.set_refresh_mark(Timestamp::from_unix_millis(9)),
        Err(CacheError::ReadOnly)
    ));
}

#[test]
fn read_only_handle_on_incompatible_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.sqlite");
    {
        let connection = Connection::open(&path).unwrap();
        connection.execute_batch("CREATE TABLE unrelated (id INTEGER);").unwrap();
    }
    let reader = SqliteCacheStore::open_read_only(&path).unwrap();
    assert_eq!(reader.schema_status(), SchemaStatus::Incompatible);
    assert!(reader.get(CacheKey::FleetStatus).unwrap().is_none());
    assert_eq!(reader.refresh_mark().unwrap(), None);
}

#[test]
fn read_only_open_of_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(SqliteCacheStore::open_read_only(&dir.path().join("absent.sqlite")).is_err());
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(SqliteCacheStore::open(&SqliteCacheConfig::new(dir.path())).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn refresh_mark_is_running_maximum(
        marks in proptest::collection::vec(0_i64..1_000_000, 1..12),
    ) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        for mark in &marks {
            store.set_refresh_mark(Timestamp::from_unix_millis(*mark)).unwrap();
        }
        let max = marks.iter().copied().max().unwrap();
        prop_assert_eq!(store.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(max)));
    }
}

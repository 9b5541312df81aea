// crates/datacore-core/tests/cache_keys.rs
// ============================================================================
// Module: Cache Key Tests
// Description: Key-to-endpoint mapping and in-memory store behavior.
// Purpose: Ensure each cached read owns exactly one endpoint and one key.
// ============================================================================

//! ## Overview
//! Cache keys map one-to-one onto read endpoints. The in-memory store keeps
//! the refresh mark monotonic and records write order.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;

use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::HttpMethod;
use datacore_core::InMemoryCacheStore;
use datacore_core::OpId;
use datacore_core::Timestamp;

#[test]
fn cache_keys_map_one_to_one_onto_read_endpoints() {
    let ops: BTreeSet<OpId> = CacheKey::ALL.iter().map(|key| key.op_id()).collect();
    assert_eq!(ops.len(), CacheKey::ALL.len());
    for key in CacheKey::ALL {
        assert_eq!(key.op_id().method(), HttpMethod::Get, "{key}");
        assert_eq!(key.read_op(2026).op_id(), key.op_id());
        assert_eq!(CacheKey::for_op(key.op_id()), Some(key));
        assert_eq!(key.as_str().parse::<CacheKey>(), Ok(key));
    }
    assert_eq!(CacheKey::for_op(OpId::CreateFuelLog), None);
    assert_eq!(CacheKey::for_op(OpId::UpdateInterval), None);
    assert_eq!(CacheKey::for_op(OpId::WorkHoursUpdateMonth), None);
}

#[test]
fn container_key_names_are_well_known() {
    let names: Vec<&str> = CacheKey::ALL.iter().map(|key| key.as_str()).collect();
    assert_eq!(
        names,
        vec!["fleetStatus", "fuelStats", "vehicles", "nextLaunch", "upcomingLaunches", "workHours"]
    );
}

#[test]
fn memory_store_replaces_and_clears_entries() {
    let store = InMemoryCacheStore::new();
    store.put(CacheKey::Vehicles, b"[1]", Timestamp::from_unix_millis(10)).unwrap();
    store.put(CacheKey::Vehicles, b"[1,2]", Timestamp::from_unix_millis(20)).unwrap();
    let item = store.get(CacheKey::Vehicles).unwrap().unwrap();
    assert_eq!(item.bytes, b"[1,2]".to_vec());
    assert_eq!(item.written_at, Timestamp::from_unix_millis(20));
    assert_eq!(store.put_log().unwrap(), vec![CacheKey::Vehicles, CacheKey::Vehicles]);

    store.clear(CacheKey::Vehicles).unwrap();
    assert!(store.get(CacheKey::Vehicles).unwrap().is_none());
}

#[test]
fn memory_store_refresh_mark_never_moves_backward() {
    let store = InMemoryCacheStore::new();
    assert_eq!(store.refresh_mark().unwrap(), None);
    store.set_refresh_mark(Timestamp::from_unix_millis(5_000)).unwrap();
    store.set_refresh_mark(Timestamp::from_unix_millis(1_000)).unwrap();
    assert_eq!(store.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(5_000)));
    store.set_refresh_mark(Timestamp::from_unix_millis(9_000)).unwrap();
    assert_eq!(store.refresh_mark().unwrap(), Some(Timestamp::from_unix_millis(9_000)));
}

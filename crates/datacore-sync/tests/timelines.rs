//! Complication timeline tests for datacore-sync.
// crates/datacore-sync/tests/timelines.rs
// ============================================================================
// Module: Timeline Tests
// Description: Complication entries, launch transitions, and reload policy.
// Purpose: Ensure complications render from the shared cache alone.
// Dependencies: datacore-sync, datacore-store-sqlite, datacore-core, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::InMemoryCacheStore;
use datacore_core::ManualClock;
use datacore_core::Timestamp;
use datacore_store_sqlite::SqliteCacheConfig;
use datacore_store_sqlite::SqliteCacheStore;
use datacore_sync::Complication;
use datacore_sync::LAUNCHED;
use datacore_sync::PLACEHOLDER;
use datacore_sync::ReloadPolicy;
use datacore_sync::Timeline;
use datacore_sync::TimelineProvider;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::macros::datetime;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Fixture clock reading.
const NOW: OffsetDateTime = datetime!(2026-03-15 12:00 UTC);

/// Writes a JSON payload under `key`.
fn seed(cache: &dyn CacheStore, key: CacheKey, value: &Value) {
    let bytes = serde_json::to_vec(value).unwrap();
    cache.put(key, &bytes, Timestamp::from_datetime(NOW)).unwrap();
}

/// Builds a provider over `cache` pinned at [`NOW`].
fn provider(cache: Arc<dyn CacheStore>) -> TimelineProvider {
    TimelineProvider::new(cache, Arc::new(ManualClock::new(NOW)))
}

/// Returns a field of the entry at `index`.
fn field<'a>(timeline: &'a Timeline, index: usize, name: &str) -> Option<&'a str> {
    timeline.entries[index].fields.get(name).map(String::as_str)
}

/// Returns the reload policy expected for [`NOW`].
fn half_hour_policy() -> ReloadPolicy {
    ReloadPolicy::After(Timestamp::from_datetime(datetime!(2026-03-15 12:30 UTC)))
}

// ============================================================================
// SECTION: Launch Countdown
// ============================================================================

#[test]
fn future_launch_yields_countdown_and_transition_entries() {
    let cache = InMemoryCacheStore::new();
    let launch = json!({ "name": "Crew-12", "net": "2026-03-15T15:00:00Z" });
    seed(&cache, CacheKey::NextLaunch, &launch);

    let timeline = provider(Arc::new(cache)).timeline(Complication::LaunchCountdown);

    assert_eq!(timeline.entries.len(), 2);
    assert_eq!(timeline.entries[0].at, Timestamp::from_datetime(NOW));
    assert_eq!(field(&timeline, 0, "status"), Some("T-03:00:00"));
    assert_eq!(field(&timeline, 0, "name"), Some("Crew-12"));
    assert_eq!(
        timeline.entries[1].at,
        Timestamp::from_datetime(datetime!(2026-03-15 15:00 UTC))
    );
    assert_eq!(field(&timeline, 1, "status"), Some(LAUNCHED));
    assert_eq!(timeline.policy, half_hour_policy());
}

#[test]
fn past_launch_renders_launched_without_transition() {
    let cache = InMemoryCacheStore::new();
    let launch = json!({ "name": "Crew-11", "net": "2026-03-15T09:00:00Z" });
    seed(&cache, CacheKey::NextLaunch, &launch);

    let timeline = provider(Arc::new(cache)).timeline(Complication::LaunchCountdown);

    assert_eq!(timeline.entries.len(), 1);
    assert_eq!(field(&timeline, 0, "status"), Some(LAUNCHED));
}

#[test]
fn missing_next_launch_renders_single_entry() {
    let cache = InMemoryCacheStore::new();
    seed(&cache, CacheKey::NextLaunch, &Value::Null);

    let timeline = provider(Arc::new(cache)).timeline(Complication::LaunchCountdown);

    assert_eq!(timeline.entries.len(), 1);
    assert_eq!(field(&timeline, 0, "status"), Some("No upcoming launch"));
}

// ============================================================================
// SECTION: Other Complications
// ============================================================================

#[test]
fn empty_cache_renders_placeholders() {
    let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let provider = provider(cache);

    for complication in Complication::ALL {
        let timeline = provider.timeline(complication);
        assert_eq!(timeline.complication, complication);
        assert_eq!(timeline.entries.len(), 1, "{complication}");
        assert_eq!(field(&timeline, 0, "status"), Some(PLACEHOLDER));
        assert_eq!(timeline.policy, half_hour_policy());
    }
}

#[test]
fn fleet_entry_shows_primary_vehicle_and_top_alert() {
    let cache = InMemoryCacheStore::new();
    seed(
        &cache,
        CacheKey::FleetStatus,
        &json!({
            "vehicle_summaries": [{ "vehicle_id": 1, "name": "Truck", "current_mileage": 55123 }],
            "interval_alerts": [
                { "interval_id": 7, "name": "Tires", "status": "due_soon" },
                { "interval_id": 42, "name": "Oil change", "status": "overdue" },
                { "interval_id": 8, "name": "Detailing", "status": "ok" }
            ]
        }),
    );
    cache.set_refresh_mark(Timestamp::from_datetime(NOW - time::Duration::minutes(10))).unwrap();

    let timeline = provider(Arc::new(cache)).timeline(Complication::Fleet);

    assert_eq!(field(&timeline, 0, "vehicle"), Some("Truck"));
    assert_eq!(field(&timeline, 0, "mileage"), Some("55123"));
    assert_eq!(field(&timeline, 0, "alerts"), Some("2"));
    assert_eq!(field(&timeline, 0, "top_alert"), Some("Oil change (overdue)"));
    assert_eq!(field(&timeline, 0, "updated"), Some("10 min ago"));
}

#[test]
fn fuel_entry_omits_absent_sparkline() {
    let cache = InMemoryCacheStore::new();
    seed(&cache, CacheKey::FleetStatus, &json!({ "vehicle_summaries": [] }));
    seed(&cache, CacheKey::FuelStats, &json!({ "average_mpg": 24.34 }));

    let timeline = provider(Arc::new(cache)).timeline(Complication::Fuel);

    assert_eq!(field(&timeline, 0, "average_mpg"), Some("24.3"));
    assert!(field(&timeline, 0, "sparkline").is_none());
    assert!(field(&timeline, 0, "spent_30d").is_none());
}

#[test]
fn fuel_entry_renders_sparkline_when_present() {
    let cache = InMemoryCacheStore::new();
    seed(
        &cache,
        CacheKey::FleetStatus,
        &json!({ "fuel_stats": { "sparkline_data": [31.2, 29.8], "total_spent_30d": 180.5 } }),
    );

    let timeline = provider(Arc::new(cache)).timeline(Complication::Fuel);

    assert_eq!(field(&timeline, 0, "sparkline"), Some("31.2,29.8"));
    assert_eq!(field(&timeline, 0, "spent_30d"), Some("180.50"));
    assert!(field(&timeline, 0, "average_mpg").is_none());
}

#[test]
fn work_hours_entry_shows_month_and_year() {
    let cache = InMemoryCacheStore::new();
    seed(
        &cache,
        CacheKey::WorkHours,
        &json!({
            "year": 2026,
            "total_hours": 320.5,
            "months": [{ "month": 3, "hours_worked": 42 }]
        }),
    );

    let timeline = provider(Arc::new(cache)).timeline(Complication::WorkHours);

    assert_eq!(field(&timeline, 0, "month"), Some("42.0"));
    assert_eq!(field(&timeline, 0, "ytd"), Some("320.5"));
    assert_eq!(field(&timeline, 0, "year"), Some("2026"));
}

#[test]
fn reload_delay_is_configurable() {
    let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let provider = provider(cache).with_reload_after(Duration::from_secs(15 * 60));

    let timeline = provider.timeline(Complication::Fleet);

    let expected = Timestamp::from_datetime(datetime!(2026-03-15 12:15 UTC));
    assert_eq!(timeline.policy, ReloadPolicy::After(expected));
}

#[test]
fn timelines_serialize_as_json() {
    let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());

    let timeline = provider(cache).timeline(Complication::WorkHours);
    let value = serde_json::to_value(&timeline).unwrap();

    assert_eq!(value["complication"], json!("work_hours"));
    let reload_at = Timestamp::from_datetime(NOW).as_unix_millis() + 1_800_000;
    assert_eq!(value["policy"]["after"], json!(reload_at));
    assert_eq!(value["entries"][0]["fields"]["status"], json!(PLACEHOLDER));
}

// ============================================================================
// SECTION: Shared Container
// ============================================================================

#[test]
fn read_only_store_serves_complications() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datacore-cache.sqlite");
    let writer = SqliteCacheStore::open(&SqliteCacheConfig::new(path.clone())).unwrap();
    let launch = json!({ "name": "Crew-12", "net": "2026-03-15T13:00:00Z" });
    seed(&writer, CacheKey::NextLaunch, &launch);

    let reader = SqliteCacheStore::open_read_only(&path).unwrap();
    let timeline = provider(Arc::new(reader)).timeline(Complication::LaunchCountdown);

    assert_eq!(timeline.entries.len(), 2);
    assert_eq!(field(&timeline, 0, "status"), Some("T-01:00:00"));
}

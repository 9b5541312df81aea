//! Ordering property tests for Datacore core.
// crates/datacore-core/tests/proptest_ordering.rs
// ============================================================================
// Module: Ordering Property Tests
// Description: Randomized checks for alert priority and staleness text.
// Purpose: Prove stable priority order and monotonic staleness over arbitrary input.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use datacore_core::AlertStatus;
use datacore_core::CacheStore;
use datacore_core::InMemoryCacheStore;
use datacore_core::IntervalAlert;
use datacore_core::IntervalId;
use datacore_core::Timestamp;
use datacore_core::describe_elapsed;
use datacore_core::sort_alerts_by_priority;
use proptest::prelude::*;
use serde_json::Map;

fn status_strategy() -> impl Strategy<Value = AlertStatus> {
    prop_oneof![
        Just(AlertStatus::Overdue),
        Just(AlertStatus::Due),
        Just(AlertStatus::DueSoon),
        "[a-z]{1,8}".prop_map(AlertStatus::from),
    ]
}

fn alert(index: usize, status: AlertStatus) -> IntervalAlert {
    IntervalAlert {
        interval_id: IntervalId::new(u64::try_from(index).unwrap()),
        vehicle_id: None,
        name: None,
        status,
        extra: Map::new(),
    }
}

/// Parses the leading number and unit rank out of a staleness string.
fn staleness_rank(text: &str) -> (u8, i64) {
    if text == "just now" {
        return (0, 0);
    }
    let (number, unit) = text.split_once(|ch: char| !ch.is_ascii_digit()).unwrap();
    let value: i64 = number.parse().unwrap();
    let rank = if unit.starts_with(" min") {
        1
    } else if unit.starts_with(" hr") {
        2
    } else {
        3
    };
    (rank, value)
}

proptest! {
    #[test]
    fn urgent_alerts_are_a_stable_priority_sort(
        statuses in prop::collection::vec(status_strategy(), 0..32)
    ) {
        let count = statuses.len();
        // Ids descend in input order.
        let alerts: Vec<IntervalAlert> = statuses
            .into_iter()
            .enumerate()
            .map(|(index, status)| alert(count - index, status))
            .collect();
        let sorted = sort_alerts_by_priority(&alerts);
        let expected: Vec<IntervalAlert> = (0_u8..=3)
            .flat_map(|priority| {
                alerts.iter().filter(move |alert| alert.status.priority() == priority).cloned()
            })
            .collect();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn staleness_text_is_monotonic_in_elapsed_time(
        a in 0_i64..10_000_000,
        b in 0_i64..10_000_000,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let (low_rank, high_rank) =
            (staleness_rank(&describe_elapsed(low)), staleness_rank(&describe_elapsed(high)));
        prop_assert!(low_rank <= high_rank);
    }

    #[test]
    fn refresh_mark_is_the_running_maximum(
        marks in prop::collection::vec(0_i64..1_000_000, 1..16),
    ) {
        let store = InMemoryCacheStore::new();
        for mark in &marks {
            store.set_refresh_mark(Timestamp::from_unix_millis(*mark)).unwrap();
        }
        let expected = marks.iter().copied().max().map(Timestamp::from_unix_millis);
        prop_assert_eq!(store.refresh_mark().unwrap(), expected);
    }
}

// crates/datacore-sync/src/timelines.rs
// ============================================================================
// Module: Complication Timelines
// Description: Timeline providers composing render states from the cache.
// Purpose: Serve on-face complications without touching any transport.
// Dependencies: datacore-core, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Complications render in a separate process that only shares the
//! persistent cache with the app. [`TimelineProvider`] reads cached payloads
//! straight from a [`CacheStore`] and composes a [`Timeline`]: a present
//! entry, an optional future transition entry, and a reload policy one
//! refresh interval ahead.
//!
//! Missing or undecodable cache entries render a placeholder entry instead
//! of failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::Clock;
use datacore_core::FleetStatus;
use datacore_core::FuelStats;
use datacore_core::Launch;
use datacore_core::MonthNumber;
use datacore_core::Timestamp;
use datacore_core::VehicleSummary;
use datacore_core::WorkHoursYear;
use datacore_core::describe_refresh_age;
use datacore_core::format_iso8601;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::OffsetDateTime;

use crate::views;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default delay before the face engine should request a new timeline.
pub const DEFAULT_TIMELINE_RELOAD: Duration = Duration::from_secs(30 * 60);

/// Status text once a launch time has passed.
pub const LAUNCHED: &str = "LAUNCHED";

/// Text rendered when no cached value is available.
pub const PLACEHOLDER: &str = "--";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Complications served by the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complication {
    /// Primary vehicle mileage and maintenance alerts.
    Fleet,
    /// Fuel economy and recent spend.
    Fuel,
    /// Countdown to the next launch.
    LaunchCountdown,
    /// Hours worked this month and year.
    WorkHours,
}

impl Complication {
    /// Every complication.
    pub const ALL: [Self; 4] = [Self::Fleet, Self::Fuel, Self::LaunchCountdown, Self::WorkHours];

    /// Returns the complication name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fleet => "fleet",
            Self::Fuel => "fuel",
            Self::LaunchCountdown => "launch_countdown",
            Self::WorkHours => "work_hours",
        }
    }
}

impl fmt::Display for Complication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized complication name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown complication: {0}")]
pub struct UnknownComplication(pub String);

impl FromStr for Complication {
    type Err = UnknownComplication;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownComplication(value.to_string()))
    }
}

/// One pre-computed render state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    /// Wall-clock time at which the entry becomes current.
    pub at: Timestamp,
    /// Rendered fields by name.
    pub fields: BTreeMap<String, String>,
}

impl TimelineEntry {
    /// Creates an empty entry current at `at`.
    fn new(at: Timestamp) -> Self {
        Self {
            at,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a rendered field.
    fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Adds a rendered field when a value is present.
    fn with_opt(self, name: &str, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }
}

/// When the face engine should request a new timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Request a new timeline after the given time.
    After(Timestamp),
}

/// Complication timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    /// Complication the timeline renders.
    pub complication: Complication,
    /// Entries in wall-clock order.
    pub entries: Vec<TimelineEntry>,
    /// Reload policy.
    pub policy: ReloadPolicy,
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Builds complication timelines from the persistent cache.
pub struct TimelineProvider {
    /// Shared cache, usually opened read-only.
    cache: Arc<dyn CacheStore>,
    /// Wall clock.
    clock: Arc<dyn Clock>,
    /// Delay used for the reload policy.
    reload_after: Duration,
}

impl TimelineProvider {
    /// Creates a provider over the shared cache.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            clock,
            reload_after: DEFAULT_TIMELINE_RELOAD,
        }
    }

    /// Replaces the reload delay.
    #[must_use]
    pub const fn with_reload_after(mut self, reload_after: Duration) -> Self {
        self.reload_after = reload_after;
        self
    }

    /// Builds the timeline for one complication.
    #[must_use]
    pub fn timeline(&self, complication: Complication) -> Timeline {
        let now = self.clock.now();
        let entries = match complication {
            Complication::Fleet => self.fleet_entries(now),
            Complication::Fuel => self.fuel_entries(now),
            Complication::LaunchCountdown => self.launch_entries(now),
            Complication::WorkHours => self.work_hours_entries(now),
        };
        let delay = i64::try_from(self.reload_after.as_millis()).unwrap_or(i64::MAX);
        let reload_at = Timestamp::from_datetime(now).as_unix_millis().saturating_add(delay);
        Timeline {
            complication,
            entries,
            policy: ReloadPolicy::After(Timestamp::from_unix_millis(reload_at)),
        }
    }

    /// Fleet entries: primary vehicle and the most urgent alert.
    fn fleet_entries(&self, now: OffsetDateTime) -> Vec<TimelineEntry> {
        let Some(status) = self.load::<FleetStatus>(CacheKey::FleetStatus) else {
            return vec![placeholder(now)];
        };
        let alerts = views::urgent_alerts(&status);
        let pending = alerts.iter().filter(|alert| alert.status.priority() < 3).count();
        let top_alert = alerts.first().map(|alert| {
            let name =
                alert.name.clone().unwrap_or_else(|| format!("Interval {}", alert.interval_id));
            format!("{name} ({})", alert.status.as_str())
        });
        let vehicle = views::primary_vehicle(&status);
        let mileage = vehicle.and_then(|vehicle| vehicle.current_mileage.as_ref());
        let entry = TimelineEntry::new(Timestamp::from_datetime(now))
            .with_opt("vehicle", vehicle.map(VehicleSummary::label))
            .with_opt("mileage", mileage.map(ToString::to_string))
            .with("alerts", pending.to_string())
            .with_opt("top_alert", top_alert)
            .with_opt("updated", self.refresh_age(now));
        vec![entry]
    }

    /// Fuel entries: economy, recent spend, and the sparkline when present.
    fn fuel_entries(&self, now: OffsetDateTime) -> Vec<TimelineEntry> {
        let summary =
            self.load::<FleetStatus>(CacheKey::FleetStatus).and_then(|status| status.fuel_stats);
        let stats = self.load::<FuelStats>(CacheKey::FuelStats);
        if summary.is_none() && stats.is_none() {
            return vec![placeholder(now)];
        }
        let average_mpg = stats.as_ref().and_then(|stats| stats.average_mpg);
        let spent_30d = summary.as_ref().and_then(|summary| summary.total_spent_30d);
        let sparkline = summary.and_then(|summary| summary.sparkline_data).map(|points| {
            points.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        });
        let entry = TimelineEntry::new(Timestamp::from_datetime(now))
            .with_opt("average_mpg", average_mpg.map(|value| format!("{value:.1}")))
            .with_opt("spent_30d", spent_30d.map(|value| format!("{value:.2}")))
            .with_opt("sparkline", sparkline)
            .with_opt("updated", self.refresh_age(now));
        vec![entry]
    }

    /// Launch countdown entries: a present countdown and the launch moment.
    fn launch_entries(&self, now: OffsetDateTime) -> Vec<TimelineEntry> {
        let Some(next) = self.load::<Option<Launch>>(CacheKey::NextLaunch) else {
            return vec![placeholder(now)];
        };
        let present = TimelineEntry::new(Timestamp::from_datetime(now));
        let Some(launch) = next else {
            return vec![present.with("status", "No upcoming launch")];
        };
        let present = present.with("name", launch.name.clone());
        match launch.net {
            Some(net) if net > now => {
                let target = format_iso8601(net);
                vec![
                    present
                        .with("status", format_countdown(net - now))
                        .with("countdown_target", target),
                    TimelineEntry::new(Timestamp::from_datetime(net))
                        .with("name", launch.name)
                        .with("status", LAUNCHED),
                ]
            }
            Some(_) => vec![present.with("status", LAUNCHED)],
            None => vec![present.with("status", "NET TBD")],
        }
    }

    /// Work hours entries: this month and year to date.
    fn work_hours_entries(&self, now: OffsetDateTime) -> Vec<TimelineEntry> {
        let Some(hours) = self.load::<WorkHoursYear>(CacheKey::WorkHours) else {
            return vec![placeholder(now)];
        };
        let month = views::month_hours(&hours, MonthNumber::from(now.month())).unwrap_or(0.0);
        let entry = TimelineEntry::new(Timestamp::from_datetime(now))
            .with("month", format!("{month:.1}"))
            .with("ytd", format!("{:.1}", views::ytd_hours(&hours)))
            .with("year", hours.year.to_string())
            .with_opt("updated", self.refresh_age(now));
        vec![entry]
    }

    /// Loads and decodes a cached payload; failures read as absent.
    fn load<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let item = self.cache.get(key).ok().flatten()?;
        serde_json::from_slice(&item.bytes).ok()
    }

    /// Returns the staleness text for the cached refresh mark.
    fn refresh_age(&self, now: OffsetDateTime) -> Option<String> {
        let mark = self.cache.refresh_mark().ok().flatten();
        describe_refresh_age(mark, Timestamp::from_datetime(now))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the single placeholder entry rendered without cached data.
fn placeholder(now: OffsetDateTime) -> TimelineEntry {
    TimelineEntry::new(Timestamp::from_datetime(now)).with("status", PLACEHOLDER)
}

/// Formats the time left until launch as `T-HH:MM:SS`.
fn format_countdown(remaining: time::Duration) -> String {
    let total = remaining.whole_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("T-{hours:02}:{minutes:02}:{seconds:02}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions and helpers are permitted.")]

    use std::str::FromStr;

    use super::Complication;
    use super::format_countdown;

    #[test]
    fn complication_names_round_trip() {
        for kind in Complication::ALL {
            assert_eq!(Complication::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(Complication::from_str("weather").is_err());
    }

    #[test]
    fn countdown_pads_and_clamps() {
        assert_eq!(format_countdown(time::Duration::hours(3)), "T-03:00:00");
        assert_eq!(format_countdown(time::Duration::seconds(3_725)), "T-01:02:05");
        assert_eq!(format_countdown(time::Duration::hours(49)), "T-49:00:00");
        assert_eq!(format_countdown(time::Duration::seconds(-5)), "T-00:00:00");
    }
}

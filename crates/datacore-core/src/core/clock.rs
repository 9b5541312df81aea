// crates/datacore-core/src/core/clock.rs
// ============================================================================
// Module: Wall-Clock Time
// Description: Timestamps, clocks, and staleness descriptions.
// Purpose: Give the cache and coordinator one notion of "now".
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are stored as unix milliseconds so they persist identically in
//! the shared container and in memory. A [`Clock`] supplies "now"; tests use
//! [`ManualClock`] to pin wall-clock time.
//!
//! Staleness text is derived from the refresh mark alone:
//! `"just now"` under a minute, `"N min ago"` under an hour, `"N hr ago"`
//! under a day, `"Nd ago"` otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Wall-clock instant in unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the unix millisecond value.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Converts a date-time to a timestamp, saturating out-of-range values.
    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        let millis = value.unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(if millis < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Converts the timestamp back to a UTC date-time.
    #[must_use]
    pub fn to_datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000).ok()
    }

    /// Returns whole seconds elapsed from `self` until `now`, never negative.
    #[must_use]
    pub const fn elapsed_secs(self, now: Self) -> i64 {
        let delta = now.0.saturating_sub(self.0);
        if delta < 0 { 0 } else { delta / 1000 }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime().and_then(|value| value.format(&Rfc3339).ok()) {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}ms", self.0),
        }
    }
}

// ============================================================================
// SECTION: Staleness
// ============================================================================

/// Seconds in one minute.
const MINUTE_SECS: i64 = 60;
/// Seconds in one hour.
const HOUR_SECS: i64 = 60 * MINUTE_SECS;
/// Seconds in one day.
const DAY_SECS: i64 = 24 * HOUR_SECS;

/// Describes how long ago a refresh happened.
#[must_use]
pub fn describe_elapsed(elapsed_secs: i64) -> String {
    if elapsed_secs < MINUTE_SECS {
        "just now".to_string()
    } else if elapsed_secs < HOUR_SECS {
        format!("{} min ago", elapsed_secs / MINUTE_SECS)
    } else if elapsed_secs < DAY_SECS {
        format!("{} hr ago", elapsed_secs / HOUR_SECS)
    } else {
        format!("{}d ago", elapsed_secs / DAY_SECS)
    }
}

/// Describes the refresh mark relative to `now`; `None` when never refreshed.
#[must_use]
pub fn describe_refresh_age(mark: Option<Timestamp>, now: Timestamp) -> Option<String> {
    mark.map(|mark| describe_elapsed(mark.elapsed_secs(now)))
}

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current local date-time.
    fn now(&self) -> OffsetDateTime;

    /// Returns the current instant as a timestamp.
    fn timestamp(&self) -> Timestamp {
        Timestamp::from_datetime(self.now())
    }
}

/// Clock backed by the system time in the local offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Manually advanced clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    /// Current pinned time.
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock pinned at `now`.
    #[must_use]
    pub const fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += delta;
        }
    }

    /// Pins the clock at `now`.
    pub fn set(&self, now: OffsetDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.now.lock().map_or(OffsetDateTime::UNIX_EPOCH, |guard| *guard)
    }
}

// ============================================================================
// SECTION: Date Formatting
// ============================================================================

/// Formats a date-time as RFC 3339, falling back to the unix seconds.
#[must_use]
pub fn format_iso8601(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.unix_timestamp().to_string())
}

/// Formats the calendar date of a date-time as `YYYY-MM-DD`.
#[must_use]
pub fn format_calendar_date(value: OffsetDateTime) -> String {
    let description = format_description!("[year]-[month]-[day]");
    value.format(description).unwrap_or_else(|_| {
        format!("{:04}-{:02}-{:02}", value.year(), u8::from(value.month()), value.day())
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn staleness_boundaries() {
        assert_eq!(describe_elapsed(0), "just now");
        assert_eq!(describe_elapsed(59), "just now");
        assert_eq!(describe_elapsed(60), "1 min ago");
        assert_eq!(describe_elapsed(3599), "59 min ago");
        assert_eq!(describe_elapsed(3600), "1 hr ago");
        assert_eq!(describe_elapsed(86_399), "23 hr ago");
        assert_eq!(describe_elapsed(86_400), "1d ago");
    }

    #[test]
    fn future_marks_read_as_just_now() {
        let now = Timestamp::from_unix_millis(10_000);
        let mark = Timestamp::from_unix_millis(70_000);
        assert_eq!(describe_refresh_age(Some(mark), now).as_deref(), Some("just now"));
        assert_eq!(describe_refresh_age(None, now), None);
    }

    #[test]
    fn calendar_date_is_zero_padded() {
        assert_eq!(format_calendar_date(datetime!(2026-03-07 23:59 UTC)), "2026-03-07");
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(datetime!(2026-01-01 00:00 UTC));
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), datetime!(2026-01-01 02:00 UTC));
        assert_eq!(clock.timestamp().as_unix_millis(), 1_767_232_800_000);
    }
}

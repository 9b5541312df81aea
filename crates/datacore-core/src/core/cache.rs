// crates/datacore-core/src/core/cache.rs
// ============================================================================
// Module: Cache Keys
// Description: Closed set of cacheable reads and cached item records.
// Purpose: Tie every persisted payload to exactly one read endpoint.
// Dependencies: serde, crate::core::{endpoint, time}
// ============================================================================

//! ## Overview
//! A [`CacheKey`] names one cacheable read. The mapping from key to endpoint
//! is one-to-one: no two keys share an endpoint and no cached endpoint maps
//! to two keys. Key strings are the well-known names stored in the shared
//! container and read by complication renderers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::clock::Timestamp;
use crate::core::endpoint::EndpointOp;
use crate::core::endpoint::OpId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Well-known container key holding the refresh mark.
pub const REFRESH_MARK_KEY: &str = "lastUpdated";

// ============================================================================
// SECTION: Cache Keys
// ============================================================================

/// Identifier of a cacheable read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheKey {
    /// Fleet dashboard status.
    FleetStatus,
    /// Fuel statistics.
    FuelStats,
    /// Vehicle list.
    Vehicles,
    /// Next launch.
    NextLaunch,
    /// Upcoming launches.
    UpcomingLaunches,
    /// Work hours for the current year.
    WorkHours,
}

impl CacheKey {
    /// Every cache key, in load order.
    pub const ALL: [Self; 6] = [
        Self::FleetStatus,
        Self::FuelStats,
        Self::Vehicles,
        Self::NextLaunch,
        Self::UpcomingLaunches,
        Self::WorkHours,
    ];

    /// Returns the container key string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FleetStatus => "fleetStatus",
            Self::FuelStats => "fuelStats",
            Self::Vehicles => "vehicles",
            Self::NextLaunch => "nextLaunch",
            Self::UpcomingLaunches => "upcomingLaunches",
            Self::WorkHours => "workHours",
        }
    }

    /// Returns the catalog operation that refreshes this key.
    #[must_use]
    pub const fn op_id(self) -> OpId {
        match self {
            Self::FleetStatus => OpId::FleetStatus,
            Self::FuelStats => OpId::FuelStats,
            Self::Vehicles => OpId::Vehicles,
            Self::NextLaunch => OpId::LaunchesNext,
            Self::UpcomingLaunches => OpId::LaunchesUpcoming,
            Self::WorkHours => OpId::WorkHoursYear,
        }
    }

    /// Builds the refresh operation for this key.
    ///
    /// `current_year` selects the work-hours year; other keys ignore it.
    #[must_use]
    pub const fn read_op(self, current_year: i32) -> EndpointOp {
        match self {
            Self::FleetStatus => EndpointOp::FleetStatus {
                vehicle_id: None,
            },
            Self::FuelStats => EndpointOp::FuelStats {
                vehicle_id: None,
            },
            Self::Vehicles => EndpointOp::Vehicles,
            Self::NextLaunch => EndpointOp::LaunchesNext,
            Self::UpcomingLaunches => EndpointOp::LaunchesUpcoming,
            Self::WorkHours => EndpointOp::WorkHoursYear {
                year: current_year,
            },
        }
    }

    /// Returns the cache key refreshed by an operation, if it is cached.
    #[must_use]
    pub fn for_op(op: OpId) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.op_id() == op)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| format!("unknown cache key: {value}"))
    }
}

// ============================================================================
// SECTION: Cached Items
// ============================================================================

/// Encoding of cached bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingTag {
    /// UTF-8 JSON exactly as received from the server.
    Json,
}

impl EncodingTag {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
        }
    }

    /// Parses a stored label; unknown labels yield `None`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Last successful payload stored for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedItem {
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`.
    pub encoding: EncodingTag,
    /// Wall-clock time the item was written.
    pub written_at: Timestamp,
}

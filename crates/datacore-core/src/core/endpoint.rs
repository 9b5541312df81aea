// crates/datacore-core/src/core/endpoint.rs
// ============================================================================
// Module: Endpoint Catalog
// Description: Closed set of remote Datacore operations.
// Purpose: Map every named operation to its method, path, and query.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! The endpoint catalog is the only place remote paths appear. Each
//! [`EndpointOp`] deterministically produces an [`Endpoint`] carrying the
//! HTTP method, path segments, and query pairs. Transports execute endpoints
//! uniformly; adding an operation means extending [`OpId`] and
//! [`EndpointOp`], never formatting strings at call sites.
//!
//! Invariants:
//! - Query builders omit absent optionals; no empty values are emitted.
//! - Path segments are percent-encoded when rendered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use url::form_urlencoded;

use crate::core::identifiers::IntervalId;
use crate::core::identifiers::MonthNumber;
use crate::core::identifiers::VehicleId;

// ============================================================================
// SECTION: Operation Ids
// ============================================================================

/// Stable identifier of a catalog operation.
///
/// The string forms double as relay message op ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpId {
    /// Fleet dashboard status.
    FleetStatus,
    /// Vehicle list.
    Vehicles,
    /// Partial update of a maintenance interval.
    UpdateInterval,
    /// Fuel statistics.
    FuelStats,
    /// New fuel log for a vehicle.
    CreateFuelLog,
    /// Next scheduled launch.
    LaunchesNext,
    /// Upcoming launches.
    LaunchesUpcoming,
    /// Work hours for a year.
    WorkHoursYear,
    /// Work hours update for one month.
    WorkHoursUpdateMonth,
}

impl OpId {
    /// Every catalog operation, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::FleetStatus,
        Self::Vehicles,
        Self::UpdateInterval,
        Self::FuelStats,
        Self::CreateFuelLog,
        Self::LaunchesNext,
        Self::LaunchesUpcoming,
        Self::WorkHoursYear,
        Self::WorkHoursUpdateMonth,
    ];

    /// Returns the stable op id string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FleetStatus => "fleetStatus",
            Self::Vehicles => "vehicles",
            Self::UpdateInterval => "updateInterval",
            Self::FuelStats => "fuelStats",
            Self::CreateFuelLog => "createFuelLog",
            Self::LaunchesNext => "launchesNext",
            Self::LaunchesUpcoming => "launchesUpcoming",
            Self::WorkHoursYear => "workHoursYear",
            Self::WorkHoursUpdateMonth => "workHoursUpdateMonth",
        }
    }

    /// Returns the HTTP method used by the operation.
    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::FleetStatus
            | Self::Vehicles
            | Self::FuelStats
            | Self::LaunchesNext
            | Self::LaunchesUpcoming
            | Self::WorkHoursYear => HttpMethod::Get,
            Self::CreateFuelLog => HttpMethod::Post,
            Self::UpdateInterval | Self::WorkHoursUpdateMonth => HttpMethod::Put,
        }
    }

    /// Returns the path template with `{param}` placeholders.
    #[must_use]
    pub const fn path_template(self) -> &'static str {
        match self {
            Self::FleetStatus => "/api/dashboard/fleet-status",
            Self::Vehicles => "/api/vehicles/",
            Self::UpdateInterval => "/api/vehicles/intervals/{id}",
            Self::FuelStats => "/api/fuel/stats",
            Self::CreateFuelLog => "/api/vehicles/{id}/fuel-logs",
            Self::LaunchesNext => "/api/astrometrics/launches/next",
            Self::LaunchesUpcoming => "/api/astrometrics/launches/upcoming",
            Self::WorkHoursYear => "/api/work-hours/{year}",
            Self::WorkHoursUpdateMonth => "/api/work-hours/{year}/{month}",
        }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown op id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation id: {0}")]
pub struct UnknownOpId(pub String);

impl FromStr for OpId {
    type Err = UnknownOpId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == value)
            .ok_or_else(|| UnknownOpId(value.to_string()))
    }
}

// ============================================================================
// SECTION: HTTP Method
// ============================================================================

/// HTTP methods used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace or partially update.
    Put,
}

impl HttpMethod {
    /// Returns the canonical method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }

    /// Returns true when repeating the request leaves the server unchanged.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        !matches!(self, Self::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// A catalog operation together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointOp {
    /// `GET /api/dashboard/fleet-status?vehicle_id=`.
    FleetStatus {
        /// Optional vehicle filter.
        vehicle_id: Option<VehicleId>,
    },
    /// `GET /api/vehicles/`.
    Vehicles,
    /// `PUT /api/vehicles/intervals/{id}`.
    UpdateInterval {
        /// Interval to update.
        interval_id: IntervalId,
    },
    /// `GET /api/fuel/stats?vehicle_id=`.
    FuelStats {
        /// Optional vehicle filter.
        vehicle_id: Option<VehicleId>,
    },
    /// `POST /api/vehicles/{id}/fuel-logs`.
    CreateFuelLog {
        /// Vehicle receiving the log.
        vehicle_id: VehicleId,
    },
    /// `GET /api/astrometrics/launches/next`.
    LaunchesNext,
    /// `GET /api/astrometrics/launches/upcoming`.
    LaunchesUpcoming,
    /// `GET /api/work-hours/{year}`.
    WorkHoursYear {
        /// Calendar year.
        year: i32,
    },
    /// `PUT /api/work-hours/{year}/{month}`.
    WorkHoursUpdateMonth {
        /// Calendar year.
        year: i32,
        /// Calendar month.
        month: MonthNumber,
    },
}

impl EndpointOp {
    /// Returns the operation identifier.
    #[must_use]
    pub const fn op_id(&self) -> OpId {
        match self {
            Self::FleetStatus {
                ..
            } => OpId::FleetStatus,
            Self::Vehicles => OpId::Vehicles,
            Self::UpdateInterval {
                ..
            } => OpId::UpdateInterval,
            Self::FuelStats {
                ..
            } => OpId::FuelStats,
            Self::CreateFuelLog {
                ..
            } => OpId::CreateFuelLog,
            Self::LaunchesNext => OpId::LaunchesNext,
            Self::LaunchesUpcoming => OpId::LaunchesUpcoming,
            Self::WorkHoursYear {
                ..
            } => OpId::WorkHoursYear,
            Self::WorkHoursUpdateMonth {
                ..
            } => OpId::WorkHoursUpdateMonth,
        }
    }
}

// ============================================================================
// SECTION: Endpoint
// ============================================================================

/// A fully described remote operation.
///
/// # Invariants
/// - `segments` are raw (unencoded) path segments; an empty trailing segment
///   renders a trailing slash.
/// - `query` never contains empty values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Operation and parameters this endpoint was built from.
    pub op: EndpointOp,
    /// HTTP method.
    pub method: HttpMethod,
    /// Raw path segments.
    pub segments: Vec<String>,
    /// Query pairs in emission order.
    pub query: Vec<(String, String)>,
}

impl Endpoint {
    /// Returns the operation identifier.
    #[must_use]
    pub const fn op_id(&self) -> OpId {
        self.op.op_id()
    }

    /// Renders the percent-encoded absolute path.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            path.push_str(&encode_path_segment(segment));
        }
        path
    }

    /// Renders the URL-encoded query string, or `None` when empty.
    #[must_use]
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.query {
            serializer.append_pair(name, value);
        }
        Some(serializer.finish())
    }
}

/// Builds endpoints from catalog operations.
pub struct EndpointCatalog;

impl EndpointCatalog {
    /// Builds the endpoint for an operation.
    ///
    /// Path segments come from [`OpId::path_template`] with each `{param}`
    /// placeholder replaced by the operation's parameter.
    #[must_use]
    pub fn build(op: EndpointOp) -> Endpoint {
        let op_id = op.op_id();
        let segments = op_id
            .path_template()
            .trim_start_matches('/')
            .split('/')
            .map(|segment| path_parameter(op, segment).unwrap_or_else(|| segment.to_string()))
            .collect();
        let query = match op {
            EndpointOp::FleetStatus {
                vehicle_id,
            }
            | EndpointOp::FuelStats {
                vehicle_id,
            } => vehicle_query(vehicle_id),
            _ => Vec::new(),
        };
        Endpoint {
            op,
            method: op_id.method(),
            segments,
            query,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the parameter value for a template placeholder, if `segment` is one.
fn path_parameter(op: EndpointOp, segment: &str) -> Option<String> {
    match (op, segment) {
        (
            EndpointOp::UpdateInterval {
                interval_id,
            },
            "{id}",
        ) => Some(interval_id.to_string()),
        (
            EndpointOp::CreateFuelLog {
                vehicle_id,
            },
            "{id}",
        ) => Some(vehicle_id.to_string()),
        (
            EndpointOp::WorkHoursYear {
                year,
            }
            | EndpointOp::WorkHoursUpdateMonth {
                year,
                ..
            },
            "{year}",
        ) => Some(year.to_string()),
        (
            EndpointOp::WorkHoursUpdateMonth {
                month,
                ..
            },
            "{month}",
        ) => Some(month.to_string()),
        _ => None,
    }
}

/// Builds the optional `vehicle_id` query pair.
fn vehicle_query(vehicle_id: Option<VehicleId>) -> Vec<(String, String)> {
    vehicle_id.map(|id| vec![("vehicle_id".to_string(), id.to_string())]).unwrap_or_default()
}

/// Percent-encodes one path segment.
///
/// `form_urlencoded` writes spaces as `+` and escapes literal `+`, so
/// swapping `+` for `%20` yields a strict path-segment encoding.
fn encode_path_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes()).collect::<String>().replace('+', "%20")
}

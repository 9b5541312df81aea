// crates/datacore-core/src/core/payloads.rs
// ============================================================================
// Module: Datacore Payloads
// Description: Typed views over server-owned JSON payloads.
// Purpose: Decode the fields the companion reads while keeping the rest.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Payload shapes are owned by the Datacore server. These types declare only
//! the fields the companion derives views from; every other field is kept in
//! an `extra` map so a decoded payload re-encodes without loss. Wire names
//! are `snake_case`, which is also the Rust field convention, so the
//! field-name mapping is the identity.
//!
//! Fields referenced by complications but possibly absent from the server
//! schema (`sparkline_data`, `total_spent_30d`, `display_name`) are optional.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::IntervalId;
use crate::core::identifiers::MonthNumber;
use crate::core::identifiers::VehicleId;

// ============================================================================
// SECTION: Fleet
// ============================================================================

/// Fleet dashboard status (`fleetStatus`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetStatus {
    /// Per-vehicle summaries; the first entry is the primary vehicle.
    #[serde(default)]
    pub vehicle_summaries: Vec<VehicleSummary>,
    /// Maintenance interval alerts.
    #[serde(default)]
    pub interval_alerts: Vec<IntervalAlert>,
    /// Fleet-wide fuel summary, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_stats: Option<FleetFuelSummary>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Summary of one vehicle inside the fleet status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSummary {
    /// Vehicle identifier.
    #[serde(alias = "id")]
    pub vehicle_id: VehicleId,
    /// Vehicle name as stored on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Presentation name; may be computed client-side instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Latest known odometer reading, kept in its wire number form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mileage: Option<Number>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleSummary {
    /// Returns a presentation label without relying on `display_name`.
    #[must_use]
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("Vehicle {}", self.vehicle_id))
    }
}

/// Maintenance alert status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertStatus {
    /// Past due.
    Overdue,
    /// Due now.
    Due,
    /// Due within the warning window.
    DueSoon,
    /// Any other server status, kept verbatim.
    Other(String),
}

impl AlertStatus {
    /// Returns the urgency rank; lower sorts first.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Overdue => 0,
            Self::Due => 1,
            Self::DueSoon => 2,
            Self::Other(_) => 3,
        }
    }

    /// Returns the wire label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Overdue => "overdue",
            Self::Due => "due",
            Self::DueSoon => "due_soon",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for AlertStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "overdue" => Self::Overdue,
            "due" => Self::Due,
            "due_soon" => Self::DueSoon,
            _ => Self::Other(value),
        }
    }
}

impl From<AlertStatus> for String {
    fn from(value: AlertStatus) -> Self {
        match value {
            AlertStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

/// One maintenance interval alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalAlert {
    /// Interval identifier.
    #[serde(alias = "id")]
    pub interval_id: IntervalId,
    /// Vehicle the interval belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<VehicleId>,
    /// Service name (for example "Oil change").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Alert status.
    pub status: AlertStatus,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fleet-wide fuel summary embedded in the fleet status.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetFuelSummary {
    /// Recent per-fill-up data points; absent on older servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparkline_data: Option<Vec<f64>>,
    /// Spend over the last 30 days; absent on older servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spent_30d: Option<f64>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sorts interval alerts by urgency, keeping insertion order for ties.
#[must_use]
pub fn sort_alerts_by_priority(alerts: &[IntervalAlert]) -> Vec<IntervalAlert> {
    let mut sorted = alerts.to_vec();
    sorted.sort_by(|left, right| left.status.priority().cmp(&right.status.priority()));
    sorted
}

// ============================================================================
// SECTION: Vehicles and Fuel
// ============================================================================

/// Vehicle record from the vehicle list (`vehicles`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Vehicle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Latest known odometer reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mileage: Option<Number>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fuel statistics (`fuelStats`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FuelStats {
    /// Average fuel economy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_mpg: Option<f64>,
    /// Total fuel spend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    /// Total gallons purchased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_gallons: Option<f64>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// SECTION: Launches
// ============================================================================

/// Rocket launch record (`nextLaunch`, `upcomingLaunches`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    /// Launch name.
    #[serde(default)]
    pub name: String,
    /// No-earlier-than launch time.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub net: Option<OffsetDateTime>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// SECTION: Work Hours
// ============================================================================

/// Work hours for one year (`workHours`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHoursYear {
    /// Calendar year.
    pub year: i32,
    /// Year-to-date total.
    #[serde(default)]
    pub total_hours: f64,
    /// Per-month entries.
    #[serde(default)]
    pub months: Vec<MonthHours>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkHoursYear {
    /// Returns hours logged for a month, if the month has an entry.
    #[must_use]
    pub fn hours_for(&self, month: MonthNumber) -> Option<f64> {
        self.months.iter().find(|entry| entry.month == month).map(|entry| entry.hours_worked)
    }
}

/// Hours logged in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthHours {
    /// Calendar month.
    pub month: MonthNumber,
    /// Hours worked.
    #[serde(default)]
    pub hours_worked: f64,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// SECTION: Mutation Bodies
// ============================================================================

/// Body for `createFuelLog`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLogBody {
    /// Gallons added.
    pub gallons_added: f64,
    /// Total cost of the fill-up.
    pub total_cost: f64,
    /// Odometer at fill-up.
    pub odometer_reading: u64,
    /// RFC 3339 timestamp of the fill-up.
    pub date: String,
}

/// Body for `updateInterval` when marking service done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDoneBody {
    /// Service date as `YYYY-MM-DD`.
    pub last_service_date: String,
    /// Mileage at service; omitted when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_mileage: Option<Number>,
}

/// Body for `workHoursUpdateMonth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHoursBody {
    /// Hours worked in the month.
    pub hours_worked: f64,
}


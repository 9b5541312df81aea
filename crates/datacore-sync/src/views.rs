// crates/datacore-sync/src/views.rs
// ============================================================================
// Module: Derived Views
// Description: Read-only projections over published payloads.
// Purpose: Share view derivation between the app and complication providers.
// Dependencies: datacore-core
// ============================================================================

//! ## Overview
//! Pure functions deriving the values the UI and complications display from
//! decoded payloads. The coordinator applies them to observable state;
//! complication providers apply them to cached payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datacore_core::FleetStatus;
use datacore_core::IntervalAlert;
use datacore_core::MonthNumber;
use datacore_core::VehicleSummary;
use datacore_core::WorkHoursYear;
use datacore_core::sort_alerts_by_priority;

// ============================================================================
// SECTION: Views
// ============================================================================

/// Returns the primary vehicle: the first fleet summary.
#[must_use]
pub fn primary_vehicle(status: &FleetStatus) -> Option<&VehicleSummary> {
    status.vehicle_summaries.first()
}

/// Returns interval alerts ordered by urgency, ties in server order.
#[must_use]
pub fn urgent_alerts(status: &FleetStatus) -> Vec<IntervalAlert> {
    sort_alerts_by_priority(&status.interval_alerts)
}

/// Returns hours logged in `month`.
#[must_use]
pub fn month_hours(work_hours: &WorkHoursYear, month: MonthNumber) -> Option<f64> {
    work_hours.hours_for(month)
}

/// Returns year-to-date hours.
#[must_use]
pub const fn ytd_hours(work_hours: &WorkHoursYear) -> f64 {
    work_hours.total_hours
}

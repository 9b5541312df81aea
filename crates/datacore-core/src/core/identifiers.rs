// crates/datacore-core/src/core/identifiers.rs
// ============================================================================
// Module: Datacore Identifiers
// Description: Typed identifiers for remote Datacore records.
// Purpose: Keep numeric record ids and calendar keys from being mixed up.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Remote records are addressed by server-assigned integers. Each identifier
//! is a transparent newtype so it serializes exactly like the wire value while
//! keeping vehicle ids, interval ids, and calendar keys distinct in code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Record Identifiers
// ============================================================================

/// Server identifier for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(u64);

impl VehicleId {
    /// Creates a new vehicle identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for VehicleId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

/// Server identifier for a maintenance interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(u64);

impl IntervalId {
    /// Creates a new interval identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for IntervalId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Calendar Keys
// ============================================================================

/// Errors raised when a calendar key is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarKeyError {
    /// Month outside `1..=12`.
    #[error("month out of range: {0}")]
    MonthOutOfRange(u8),
}

/// Calendar month number (1 = January).
///
/// # Invariants
/// - The wrapped value is always within `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MonthNumber(u8);

impl MonthNumber {
    /// Creates a month number, rejecting values outside `1..=12`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarKeyError::MonthOutOfRange`] for invalid months.
    pub const fn new(month: u8) -> Result<Self, CalendarKeyError> {
        if month == 0 || month > 12 {
            return Err(CalendarKeyError::MonthOutOfRange(month));
        }
        Ok(Self(month))
    }

    /// Returns the month number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MonthNumber {
    type Error = CalendarKeyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonthNumber> for u8 {
    fn from(value: MonthNumber) -> Self {
        value.0
    }
}

impl From<time::Month> for MonthNumber {
    fn from(value: time::Month) -> Self {
        Self(u8::from(value))
    }
}

impl fmt::Display for MonthNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

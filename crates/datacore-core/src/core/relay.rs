// crates/datacore-core/src/core/relay.rs
// ============================================================================
// Module: Relay Wire Messages
// Description: Messages exchanged with the paired host.
// Purpose: Carry catalog requests by op id instead of by URL.
// Dependencies: base64, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The relay never sends URLs. A [`RelayRequest`] names the catalog op and its
//! parameters; the paired host rebuilds the endpoint from the same closed set
//! and answers with a [`RelayReply`]. Reply bytes are base64 text inside the
//! JSON envelope so arbitrary payload bytes survive the message channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::endpoint::EndpointOp;
use crate::core::endpoint::OpId;
use crate::core::identifiers::IntervalId;
use crate::core::identifiers::MonthNumber;
use crate::core::identifiers::VehicleId;
use crate::core::request::TransportRequest;
use crate::interfaces::TransportFailure;
use crate::interfaces::TransportOutcome;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when a relay request cannot be mapped back to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayMessageError {
    /// Message was not valid JSON for the envelope.
    #[error("malformed relay message: {0}")]
    Malformed(String),
    /// Operation requires a parameter that was not sent.
    #[error("{op} requires parameter {param}")]
    MissingParam {
        /// Operation id.
        op: OpId,
        /// Missing parameter name.
        param: &'static str,
    },
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// Relay request envelope: `{ request, params? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    /// Catalog operation id.
    pub request: OpId,
    /// Operation parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RelayParams>,
}

/// Parameters carried alongside a relay request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayParams {
    /// Vehicle id for vehicle-scoped operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<VehicleId>,
    /// Interval id for `updateInterval`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_id: Option<IntervalId>,
    /// Year for work-hours operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Month for `workHoursUpdateMonth`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<MonthNumber>,
    /// Request body for mutations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RelayParams {
    /// Returns true when no parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vehicle_id.is_none()
            && self.interval_id.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.body.is_none()
    }
}

impl RelayRequest {
    /// Builds the relay envelope for a transport request.
    #[must_use]
    pub fn from_request(request: &TransportRequest) -> Self {
        let mut params = RelayParams {
            body: request.body.clone(),
            ..RelayParams::default()
        };
        match request.endpoint.op {
            EndpointOp::FleetStatus {
                vehicle_id,
            }
            | EndpointOp::FuelStats {
                vehicle_id,
            } => params.vehicle_id = vehicle_id,
            EndpointOp::CreateFuelLog {
                vehicle_id,
            } => params.vehicle_id = Some(vehicle_id),
            EndpointOp::UpdateInterval {
                interval_id,
            } => params.interval_id = Some(interval_id),
            EndpointOp::WorkHoursYear {
                year,
            } => params.year = Some(year),
            EndpointOp::WorkHoursUpdateMonth {
                year,
                month,
            } => {
                params.year = Some(year);
                params.month = Some(month);
            }
            EndpointOp::Vehicles | EndpointOp::LaunchesNext | EndpointOp::LaunchesUpcoming => {}
        }
        Self {
            request: request.endpoint.op_id(),
            params: if params.is_empty() { None } else { Some(params) },
        }
    }

    /// Rebuilds the catalog request this envelope describes.
    ///
    /// # Errors
    ///
    /// Returns [`RelayMessageError::MissingParam`] when a required path
    /// parameter is absent.
    pub fn to_transport_request(&self) -> Result<TransportRequest, RelayMessageError> {
        let params = self.params.clone().unwrap_or_default();
        let op = self.request;
        let missing = |param: &'static str| RelayMessageError::MissingParam {
            op,
            param,
        };
        let endpoint_op = match op {
            OpId::FleetStatus => EndpointOp::FleetStatus {
                vehicle_id: params.vehicle_id,
            },
            OpId::Vehicles => EndpointOp::Vehicles,
            OpId::UpdateInterval => EndpointOp::UpdateInterval {
                interval_id: params.interval_id.ok_or_else(|| missing("intervalId"))?,
            },
            OpId::FuelStats => EndpointOp::FuelStats {
                vehicle_id: params.vehicle_id,
            },
            OpId::CreateFuelLog => EndpointOp::CreateFuelLog {
                vehicle_id: params.vehicle_id.ok_or_else(|| missing("vehicleId"))?,
            },
            OpId::LaunchesNext => EndpointOp::LaunchesNext,
            OpId::LaunchesUpcoming => EndpointOp::LaunchesUpcoming,
            OpId::WorkHoursYear => EndpointOp::WorkHoursYear {
                year: params.year.ok_or_else(|| missing("year"))?,
            },
            OpId::WorkHoursUpdateMonth => EndpointOp::WorkHoursUpdateMonth {
                year: params.year.ok_or_else(|| missing("year"))?,
                month: params.month.ok_or_else(|| missing("month"))?,
            },
        };
        let mut request = TransportRequest::new(endpoint_op);
        request.body = params.body;
        Ok(request)
    }

    /// Decodes a relay request from message bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RelayMessageError::Malformed`] when the bytes are not a
    /// request envelope or name an unknown op id.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RelayMessageError> {
        serde_json::from_slice(bytes).map_err(|err| RelayMessageError::Malformed(err.to_string()))
    }
}

// ============================================================================
// SECTION: Reply
// ============================================================================

/// Relay reply envelope: `{ data }` on success or `{ error }` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReply {
    /// Base64-encoded response bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Error descriptor from the paired host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayReply {
    /// Builds a success reply carrying raw bytes.
    #[must_use]
    pub fn success(bytes: &[u8]) -> Self {
        Self {
            data: Some(STANDARD.encode(bytes)),
            error: None,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    /// Converts the reply into a transport outcome.
    ///
    /// An error envelope wins over data; an envelope with neither is a
    /// decode failure.
    #[must_use]
    pub fn into_outcome(self) -> TransportOutcome {
        if let Some(message) = self.error {
            return Err(TransportFailure::RelayRemoteFailure(message));
        }
        match self.data {
            Some(data) => STANDARD
                .decode(data.as_bytes())
                .map_err(|err| TransportFailure::Decode(format!("relay data: {err}"))),
            None => Err(TransportFailure::Decode("relay reply carried no data".to_string())),
        }
    }
}

impl From<TransportOutcome> for RelayReply {
    fn from(outcome: TransportOutcome) -> Self {
        match outcome {
            Ok(bytes) => Self::success(&bytes),
            Err(failure) => Self::failure(format!("{}: {failure}", failure.kind())),
        }
    }
}

// ============================================================================
// SECTION: Config Push
// ============================================================================

/// Config push delivered over the queued user-info channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPush {
    /// Server base address; empty means unset.
    pub server_address: String,
}

impl ConfigPush {
    /// Returns the pushed address, or `None` when the push clears it.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        let trimmed = self.server_address.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }
}

// crates/datacore-core/src/core/mod.rs
// ============================================================================
// Module: Datacore Core Types
// Description: Endpoint catalog, payloads, cache keys, and relay messages.
// Purpose: Provide the stable value types every companion component shares.
// Dependencies: serde, serde_json, time, url
// ============================================================================

//! ## Overview
//! Core types describe the closed set of remote operations, the payloads they
//! return, the keys those payloads are cached under, and the messages the
//! relay exchanges with the paired host. Everything here is a plain value.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod clock;
pub mod endpoint;
pub mod identifiers;
pub mod payloads;
pub mod relay;
pub mod request;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheKey;
pub use cache::CachedItem;
pub use cache::EncodingTag;
pub use cache::REFRESH_MARK_KEY;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use clock::Timestamp;
pub use clock::describe_elapsed;
pub use clock::describe_refresh_age;
pub use clock::format_calendar_date;
pub use clock::format_iso8601;
pub use endpoint::Endpoint;
pub use endpoint::EndpointCatalog;
pub use endpoint::EndpointOp;
pub use endpoint::HttpMethod;
pub use endpoint::OpId;
pub use endpoint::UnknownOpId;
pub use identifiers::CalendarKeyError;
pub use identifiers::IntervalId;
pub use identifiers::MonthNumber;
pub use identifiers::VehicleId;
pub use payloads::AlertStatus;
pub use payloads::FleetFuelSummary;
pub use payloads::FleetStatus;
pub use payloads::FuelLogBody;
pub use payloads::FuelStats;
pub use payloads::IntervalAlert;
pub use payloads::Launch;
pub use payloads::MonthHours;
pub use payloads::ServiceDoneBody;
pub use payloads::Vehicle;
pub use payloads::VehicleSummary;
pub use payloads::WorkHoursBody;
pub use payloads::WorkHoursYear;
pub use payloads::sort_alerts_by_priority;
pub use relay::ConfigPush;
pub use relay::RelayMessageError;
pub use relay::RelayParams;
pub use relay::RelayReply;
pub use relay::RelayRequest;
pub use request::HttpRequest;
pub use request::TransportRequest;

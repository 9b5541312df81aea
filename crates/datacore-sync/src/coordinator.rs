// crates/datacore-sync/src/coordinator.rs
// ============================================================================
// Module: Data Coordinator
// Description: Cache-first reads, transport fallback, and mutations.
// Purpose: Single source of truth for companion UI and complication data.
// Dependencies: datacore-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! The [`DataCoordinator`] owns the observable state behind the companion UI.
//! Reads are cache-first: [`DataCoordinator::hydrate`] publishes whatever the
//! persistent cache holds, then refreshes fetch through the direct transport
//! and fall back to the relay transport exactly once on any direct failure.
//!
//! Within one refresh the order is fixed: publish, then cache write, then the
//! refresh mark. Nothing is written unless the response decodes under the
//! key's payload type. Failures keep the previously published value and
//! surface a short message through [`CoordinatorState::last_error`].
//!
//! Mutations never write the cache. On success they re-fetch the reads they
//! affect, once each.
//!
//! Security posture: server bytes are untrusted and are decoded before any
//! cache write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::Clock;
use datacore_core::EndpointOp;
use datacore_core::FleetStatus;
use datacore_core::FuelLogBody;
use datacore_core::FuelStats;
use datacore_core::IntervalAlert;
use datacore_core::IntervalId;
use datacore_core::Launch;
use datacore_core::MonthNumber;
use datacore_core::OpId;
use datacore_core::ServiceDoneBody;
use datacore_core::SystemClock;
use datacore_core::Timestamp;
use datacore_core::Transport;
use datacore_core::TransportFailure;
use datacore_core::TransportKind;
use datacore_core::TransportOutcome;
use datacore_core::TransportRequest;
use datacore_core::Vehicle;
use datacore_core::VehicleId;
use datacore_core::VehicleSummary;
use datacore_core::WorkHoursBody;
use datacore_core::WorkHoursYear;
use datacore_core::describe_refresh_age;
use datacore_core::format_calendar_date;
use datacore_core::format_iso8601;

use crate::events::HydrateStatus;
use crate::events::NoopEventSink;
use crate::events::SyncEvent;
use crate::events::SyncEventDetail;
use crate::events::SyncEventSink;
use crate::observe::CancelToken;
use crate::observe::Observable;
use crate::views;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message surfaced when fuel logging fails.
pub const LOG_FUEL_FAILED: &str = "Failed to log fuel";
/// Message surfaced when marking service fails.
pub const MARK_SERVICE_FAILED: &str = "Failed to mark service done";
/// Message surfaced when logging work hours fails.
pub const LOG_HOURS_FAILED: &str = "Failed to log work hours";

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one keyed refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fresh bytes decoded, were published, and were written to the cache.
    Stored {
        /// Transport that produced the bytes.
        transport: TransportKind,
        /// Response size in bytes.
        bytes: usize,
    },
    /// Every transport failed or the bytes did not decode.
    Failed(TransportFailure),
    /// The caller cancelled the refresh; nothing was written.
    Cancelled,
}

impl RefreshOutcome {
    /// Returns true when the refresh stored fresh bytes.
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(
            self,
            Self::Stored {
                ..
            }
        )
    }

    /// Returns the outcome label used in events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Stored {
                ..
            } => "stored",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result of a group refresh across every cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAllReport {
    /// Outcome per key.
    pub outcomes: BTreeMap<CacheKey, RefreshOutcome>,
    /// Whether the refresh mark advanced.
    pub marked: bool,
    /// Whether the group was cancelled.
    pub cancelled: bool,
}

impl LoadAllReport {
    /// Returns how many keys stored fresh bytes.
    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.outcomes.values().filter(|outcome| outcome.is_stored()).count()
    }

    /// Returns how many keys failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|outcome| matches!(outcome, RefreshOutcome::Failed(_)))
            .count()
    }
}

/// Result of running a request through the transport chain.
struct ChainOutcome {
    /// Final outcome.
    result: TransportOutcome,
    /// Transport that produced `result`.
    transport: TransportKind,
    /// Direct failure that triggered the relay attempt.
    direct_failure: Option<TransportFailure>,
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Observable state published by the coordinator.
#[derive(Debug, Default)]
pub struct CoordinatorState {
    /// Fleet dashboard status.
    pub fleet_status: Observable<FleetStatus>,
    /// Fuel statistics.
    pub fuel_stats: Observable<FuelStats>,
    /// Vehicle list.
    pub vehicles: Observable<Vec<Vehicle>>,
    /// Next launch; `Some(None)` when the server reports none.
    pub next_launch: Observable<Option<Launch>>,
    /// Upcoming launches.
    pub upcoming_launches: Observable<Vec<Launch>>,
    /// Work hours for the current year.
    pub work_hours: Observable<WorkHoursYear>,
    /// Last non-fatal error message.
    pub last_error: Observable<String>,
    /// Global refresh mark.
    pub refresh_mark: Observable<Timestamp>,
}

impl CoordinatorState {
    /// Returns whether `key` has a published value.
    #[must_use]
    pub fn is_loaded(&self, key: CacheKey) -> bool {
        match key {
            CacheKey::FleetStatus => self.fleet_status.is_loaded(),
            CacheKey::FuelStats => self.fuel_stats.is_loaded(),
            CacheKey::Vehicles => self.vehicles.is_loaded(),
            CacheKey::NextLaunch => self.next_launch.is_loaded(),
            CacheKey::UpcomingLaunches => self.upcoming_launches.is_loaded(),
            CacheKey::WorkHours => self.work_hours.is_loaded(),
        }
    }
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Orchestrates cache, transports, and observable state.
pub struct DataCoordinator {
    /// Primary transport.
    direct: Arc<dyn Transport>,
    /// Fallback transport.
    relay: Arc<dyn Transport>,
    /// Persistent cache.
    cache: Arc<dyn CacheStore>,
    /// Wall clock.
    clock: Arc<dyn Clock>,
    /// Event sink.
    events: Arc<dyn SyncEventSink>,
    /// Observable state.
    state: CoordinatorState,
}

impl DataCoordinator {
    /// Creates a coordinator over the given transports and cache.
    #[must_use]
    pub fn new(
        direct: Arc<dyn Transport>,
        relay: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            direct,
            relay,
            cache,
            clock: Arc::new(SystemClock),
            events: Arc::new(NoopEventSink),
            state: CoordinatorState::default(),
        }
    }

    /// Replaces the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn SyncEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the observable state.
    #[must_use]
    pub const fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Returns the wall clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Publishes every decodable cached value and the refresh mark.
    ///
    /// Entries that fail to decode are treated as absent. Returns the number
    /// of keys published.
    pub fn hydrate(&self) -> usize {
        let mut hits = 0;
        for key in CacheKey::ALL {
            let status = match self.cache.get(key) {
                Ok(Some(item)) => match self.publish(key, &item.bytes) {
                    Ok(()) => HydrateStatus::Hit,
                    Err(_) => HydrateStatus::Stale,
                },
                Ok(None) => HydrateStatus::Miss,
                Err(err) => {
                    self.record_cache_error(Some(key), &err.to_string());
                    HydrateStatus::Error
                }
            };
            if status == HydrateStatus::Hit {
                hits += 1;
            }
            self.emit(SyncEventDetail::Hydrate {
                key,
                status,
            });
        }
        match self.cache.refresh_mark() {
            Ok(Some(mark)) => self.state.refresh_mark.publish(mark),
            Ok(None) => {}
            Err(err) => self.record_cache_error(None, &err.to_string()),
        }
        hits
    }

    /// Hydrates from the cache, then refreshes every key.
    pub async fn open(&self) -> LoadAllReport {
        self.hydrate();
        self.load_all().await
    }

    /// Refreshes one key and advances the refresh mark on success.
    pub async fn refresh(&self, key: CacheKey) -> RefreshOutcome {
        self.refresh_keyed(key, &CancelToken::new(), true).await
    }

    /// Refreshes one key unless `cancel` fires first.
    pub async fn refresh_with_cancel(
        &self,
        key: CacheKey,
        cancel: &CancelToken,
    ) -> RefreshOutcome {
        self.refresh_keyed(key, cancel, true).await
    }

    /// Refreshes every key concurrently and marks the refresh once at the end.
    pub async fn load_all(&self) -> LoadAllReport {
        self.load_all_with_cancel(&CancelToken::new()).await
    }

    /// Refreshes every key concurrently unless `cancel` fires.
    ///
    /// Individual failures do not abort the group. The refresh mark advances
    /// once, after every child completes, when at least one key stored fresh
    /// bytes. Keys that stored before a cancellation still count; cancelled
    /// keys write nothing.
    pub async fn load_all_with_cancel(&self, cancel: &CancelToken) -> LoadAllReport {
        self.state.last_error.clear();
        let (fleet, fuel, vehicles, next, upcoming, hours) = tokio::join!(
            self.refresh_keyed(CacheKey::FleetStatus, cancel, false),
            self.refresh_keyed(CacheKey::FuelStats, cancel, false),
            self.refresh_keyed(CacheKey::Vehicles, cancel, false),
            self.refresh_keyed(CacheKey::NextLaunch, cancel, false),
            self.refresh_keyed(CacheKey::UpcomingLaunches, cancel, false),
            self.refresh_keyed(CacheKey::WorkHours, cancel, false),
        );
        let outcomes = BTreeMap::from([
            (CacheKey::FleetStatus, fleet),
            (CacheKey::FuelStats, fuel),
            (CacheKey::Vehicles, vehicles),
            (CacheKey::NextLaunch, next),
            (CacheKey::UpcomingLaunches, upcoming),
            (CacheKey::WorkHours, hours),
        ]);
        let cancelled = cancel.is_cancelled();
        let marked = outcomes.values().any(RefreshOutcome::is_stored);
        if marked {
            self.advance_refresh_mark(self.clock.timestamp());
        }
        let report = LoadAllReport {
            outcomes,
            marked,
            cancelled,
        };
        self.emit(SyncEventDetail::LoadAll {
            stored: report.stored_count(),
            failed: report.failed_count(),
            marked,
            cancelled,
        });
        report
    }

    /// Runs one keyed refresh.
    async fn refresh_keyed(
        &self,
        key: CacheKey,
        cancel: &CancelToken,
        mark: bool,
    ) -> RefreshOutcome {
        let request = TransportRequest::new(key.read_op(self.clock.now().year()));
        let chain = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            chain = self.execute_chain(&request) => Some(chain),
        };
        let Some(chain) = chain.filter(|_| !cancel.is_cancelled()) else {
            self.emit_refresh(key, None, &RefreshOutcome::Cancelled, None, 0);
            return RefreshOutcome::Cancelled;
        };
        let direct_failure = chain.direct_failure.as_ref().map(TransportFailure::kind);
        let outcome = match chain.result {
            Ok(bytes) => match self.publish(key, &bytes) {
                Ok(()) => {
                    let now = self.clock.timestamp();
                    if let Err(err) = self.cache.put(key, &bytes, now) {
                        self.record_cache_error(Some(key), &err.to_string());
                    }
                    if mark {
                        self.advance_refresh_mark(now);
                    }
                    RefreshOutcome::Stored {
                        transport: chain.transport,
                        bytes: bytes.len(),
                    }
                }
                Err(err) => {
                    let failure = TransportFailure::Decode(format!("{key}: {err}"));
                    self.state.last_error.publish(failure.to_string());
                    RefreshOutcome::Failed(failure)
                }
            },
            Err(failure) => {
                let message = surfaced_message(chain.direct_failure.as_ref(), &failure);
                self.state.last_error.publish(message);
                RefreshOutcome::Failed(failure)
            }
        };
        let size = match &outcome {
            RefreshOutcome::Stored {
                bytes,
                ..
            } => *bytes,
            _ => 0,
        };
        self.emit_refresh(key, Some(chain.transport), &outcome, direct_failure, size);
        outcome
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Logs a fuel fill-up for a vehicle.
    ///
    /// On success re-fetches fuel statistics and fleet status. On failure
    /// surfaces [`LOG_FUEL_FAILED`] and returns false.
    pub async fn log_fuel(
        &self,
        vehicle_id: VehicleId,
        gallons: f64,
        total_cost: f64,
        odometer: u64,
    ) -> bool {
        let body = FuelLogBody {
            gallons_added: gallons,
            total_cost,
            odometer_reading: odometer,
            date: format_iso8601(self.clock.now()),
        };
        let request = TransportRequest::with_body(
            EndpointOp::CreateFuelLog {
                vehicle_id,
            },
            &body,
        );
        let affected = [CacheKey::FuelStats, CacheKey::FleetStatus];
        self.mutate(OpId::CreateFuelLog, request, LOG_FUEL_FAILED, &affected).await
    }

    /// Records a maintenance interval as serviced today.
    ///
    /// The mileage is the primary vehicle's current mileage when known. On
    /// success re-fetches fleet status.
    pub async fn mark_service_done(&self, interval_id: IntervalId) -> bool {
        let body = ServiceDoneBody {
            last_service_date: format_calendar_date(self.clock.now()),
            last_service_mileage: self
                .primary_vehicle()
                .and_then(|vehicle| vehicle.current_mileage),
        };
        let request = TransportRequest::with_body(
            EndpointOp::UpdateInterval {
                interval_id,
            },
            &body,
        );
        self.mutate(OpId::UpdateInterval, request, MARK_SERVICE_FAILED, &[CacheKey::FleetStatus])
            .await
    }

    /// Logs hours worked in the current month.
    ///
    /// On success re-fetches the current year's work hours.
    pub async fn log_work_hours(&self, hours: f64) -> bool {
        let now = self.clock.now();
        let body = WorkHoursBody {
            hours_worked: hours,
        };
        let request = TransportRequest::with_body(
            EndpointOp::WorkHoursUpdateMonth {
                year: now.year(),
                month: MonthNumber::from(now.month()),
            },
            &body,
        );
        self.mutate(OpId::WorkHoursUpdateMonth, request, LOG_HOURS_FAILED, &[CacheKey::WorkHours])
            .await
    }

    /// Executes a mutation and re-fetches the affected reads on success.
    async fn mutate(
        &self,
        op: OpId,
        request: Result<TransportRequest, TransportFailure>,
        failure_message: &str,
        affected: &[CacheKey],
    ) -> bool {
        let result = match request {
            Ok(request) => self.execute_chain(&request).await.result,
            Err(failure) => Err(failure),
        };
        match result {
            Ok(_) => {
                self.emit(SyncEventDetail::Mutation {
                    op,
                    succeeded: true,
                    failure_kind: None,
                    refreshed: affected.to_vec(),
                });
                for key in affected {
                    self.refresh(*key).await;
                }
                true
            }
            Err(failure) => {
                self.state.last_error.publish(failure_message.to_string());
                self.emit(SyncEventDetail::Mutation {
                    op,
                    succeeded: false,
                    failure_kind: Some(failure.kind()),
                    refreshed: Vec::new(),
                });
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Derived Views
    // ------------------------------------------------------------------------

    /// Returns the primary vehicle.
    #[must_use]
    pub fn primary_vehicle(&self) -> Option<VehicleSummary> {
        self.state.fleet_status.get().and_then(|status| views::primary_vehicle(&status).cloned())
    }

    /// Returns interval alerts ordered by urgency.
    #[must_use]
    pub fn urgent_alerts(&self) -> Vec<IntervalAlert> {
        self.state
            .fleet_status
            .get()
            .map(|status| views::urgent_alerts(&status))
            .unwrap_or_default()
    }

    /// Returns hours logged in the current month.
    #[must_use]
    pub fn current_month_hours(&self) -> Option<f64> {
        let month = MonthNumber::from(self.clock.now().month());
        self.state.work_hours.get().and_then(|hours| views::month_hours(&hours, month))
    }

    /// Returns year-to-date hours.
    #[must_use]
    pub fn ytd_hours(&self) -> Option<f64> {
        self.state.work_hours.get().map(|hours| views::ytd_hours(&hours))
    }

    /// Returns the staleness text for the refresh mark.
    #[must_use]
    pub fn last_refresh_description(&self) -> Option<String> {
        describe_refresh_age(self.state.refresh_mark.get(), self.clock.timestamp())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Runs direct, then relay exactly once when direct fails.
    ///
    /// A non-idempotent request only moves to relay when direct failed before
    /// sending; any later failure may mean the server already applied it.
    async fn execute_chain(&self, request: &TransportRequest) -> ChainOutcome {
        match self.direct.execute(request).await {
            Ok(bytes) => ChainOutcome {
                result: Ok(bytes),
                transport: self.direct.kind(),
                direct_failure: None,
            },
            Err(failure) if request.endpoint.method.is_idempotent() || failure.is_pre_send() => {
                ChainOutcome {
                    result: self.relay.execute(request).await,
                    transport: self.relay.kind(),
                    direct_failure: Some(failure),
                }
            }
            Err(failure) => ChainOutcome {
                result: Err(failure),
                transport: self.direct.kind(),
                direct_failure: None,
            },
        }
    }

    /// Decodes bytes under the key's payload type and publishes them.
    fn publish(&self, key: CacheKey, bytes: &[u8]) -> Result<(), serde_json::Error> {
        match key {
            CacheKey::FleetStatus => {
                self.state.fleet_status.publish(serde_json::from_slice(bytes)?);
            }
            CacheKey::FuelStats => self.state.fuel_stats.publish(serde_json::from_slice(bytes)?),
            CacheKey::Vehicles => self.state.vehicles.publish(serde_json::from_slice(bytes)?),
            CacheKey::NextLaunch => self.state.next_launch.publish(serde_json::from_slice(bytes)?),
            CacheKey::UpcomingLaunches => {
                self.state.upcoming_launches.publish(serde_json::from_slice(bytes)?);
            }
            CacheKey::WorkHours => self.state.work_hours.publish(serde_json::from_slice(bytes)?),
        }
        Ok(())
    }

    /// Advances the refresh mark in the cache and the observable.
    fn advance_refresh_mark(&self, mark: Timestamp) {
        if let Err(err) = self.cache.set_refresh_mark(mark) {
            self.record_cache_error(None, &err.to_string());
        }
        if self.state.refresh_mark.get().is_none_or(|current| current < mark) {
            self.state.refresh_mark.publish(mark);
        }
    }

    /// Reports a cache backend error.
    fn record_cache_error(&self, key: Option<CacheKey>, message: &str) {
        self.emit(SyncEventDetail::CacheError {
            key,
            message: message.to_string(),
        });
    }

    /// Emits a refresh event.
    fn emit_refresh(
        &self,
        key: CacheKey,
        transport: Option<TransportKind>,
        outcome: &RefreshOutcome,
        direct_failure: Option<&'static str>,
        bytes: usize,
    ) {
        let failure_kind = match outcome {
            RefreshOutcome::Failed(failure) => Some(failure.kind()),
            _ => None,
        };
        self.emit(SyncEventDetail::Refresh {
            key,
            transport,
            outcome: outcome.label(),
            failure_kind,
            direct_failure,
            bytes,
        });
    }

    /// Sends an event to the sink.
    fn emit(&self, detail: SyncEventDetail) {
        self.events.record(&SyncEvent::new(detail));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Picks the message surfaced for a failed read.
///
/// A missing server address is reported as such even when relay was tried.
fn surfaced_message(
    direct_failure: Option<&TransportFailure>,
    failure: &TransportFailure,
) -> String {
    match direct_failure {
        Some(TransportFailure::NoServer) => TransportFailure::NoServer.to_string(),
        _ => failure.to_string(),
    }
}

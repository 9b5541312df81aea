// crates/datacore-transport/src/scripted.rs
// ============================================================================
// Module: Scripted Transport
// Description: In-memory transport keyed by catalog op id.
// Purpose: Substitute direct and relay transports in tests and demos.
// Dependencies: datacore-core, tokio
// ============================================================================

//! ## Overview
//! [`ScriptedTransport`] answers each request from outcomes scripted per
//! [`OpId`]: queued one-shot outcomes first, then a sticky default for the
//! op, then a sticky fallback for every op. Every request is recorded so
//! tests can assert fallback order and refetch counts. An optional delay
//! makes in-flight requests observable for cancellation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use datacore_core::OpId;
use datacore_core::Transport;
use datacore_core::TransportFailure;
use datacore_core::TransportKind;
use datacore_core::TransportOutcome;
use datacore_core::TransportRequest;

// ============================================================================
// SECTION: Scripted Transport
// ============================================================================

/// Mutable script state.
#[derive(Debug, Default)]
struct Script {
    /// One-shot outcomes per op, consumed in order.
    queued: BTreeMap<OpId, VecDeque<TransportOutcome>>,
    /// Sticky outcome per op.
    defaults: BTreeMap<OpId, TransportOutcome>,
    /// Sticky outcome for ops without a script.
    fallback: Option<TransportOutcome>,
    /// Requests in arrival order.
    calls: Vec<TransportRequest>,
}

/// In-memory transport with scripted outcomes.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    /// Kind reported to callers.
    kind: TransportKind,
    /// Delay applied before answering.
    delay: Option<Duration>,
    /// Shared script state.
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Creates a transport reporting [`TransportKind::Scripted`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(TransportKind::Scripted)
    }

    /// Creates a transport that reports `kind`, to stand in for a real one.
    #[must_use]
    pub fn with_kind(kind: TransportKind) -> Self {
        Self {
            kind,
            delay: None,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Delays every answer by `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a one-shot outcome for `op`.
    pub fn push(&self, op: OpId, outcome: TransportOutcome) {
        self.lock().queued.entry(op).or_default().push_back(outcome);
    }

    /// Sets the sticky outcome for `op`.
    pub fn set_default(&self, op: OpId, outcome: TransportOutcome) {
        self.lock().defaults.insert(op, outcome);
    }

    /// Sets the sticky outcome for ops without their own script.
    pub fn set_fallback(&self, outcome: TransportOutcome) {
        self.lock().fallback = Some(outcome);
    }

    /// Returns every recorded request.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportRequest> {
        self.lock().calls.clone()
    }

    /// Returns how many requests were made for `op`.
    #[must_use]
    pub fn call_count(&self, op: OpId) -> usize {
        self.lock().calls.iter().filter(|request| request.endpoint.op_id() == op).count()
    }

    /// Returns the op ids of recorded requests in arrival order.
    #[must_use]
    pub fn call_ops(&self) -> Vec<OpId> {
        self.lock().calls.iter().map(|request| request.endpoint.op_id()).collect()
    }

    /// Clears the call log; scripts are kept.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Locks the script, recovering from poisoning.
    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the request and picks its outcome.
    fn answer(&self, request: &TransportRequest) -> TransportOutcome {
        let op = request.endpoint.op_id();
        let mut script = self.lock();
        script.calls.push(request.clone());
        if let Some(outcome) = script.queued.get_mut(&op).and_then(VecDeque::pop_front) {
            return outcome;
        }
        if let Some(outcome) = script.defaults.get(&op) {
            return outcome.clone();
        }
        script.fallback.clone().unwrap_or_else(|| {
            Err(TransportFailure::Unreachable(format!("no scripted outcome for {op}")))
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn execute(&self, request: &TransportRequest) -> TransportOutcome {
        let outcome = self.answer(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use datacore_core::EndpointOp;
    use datacore_core::VehicleId;

    use super::*;

    #[tokio::test]
    async fn queued_outcomes_precede_defaults() {
        let transport = ScriptedTransport::new();
        transport.set_default(OpId::Vehicles, Ok(b"default".to_vec()));
        transport.push(OpId::Vehicles, Err(TransportFailure::Timeout));
        let request = TransportRequest::new(EndpointOp::Vehicles);

        assert_eq!(transport.execute(&request).await, Err(TransportFailure::Timeout));
        assert_eq!(transport.execute(&request).await, Ok(b"default".to_vec()));
        assert_eq!(transport.execute(&request).await, Ok(b"default".to_vec()));
        assert_eq!(transport.call_count(OpId::Vehicles), 3);
    }

    #[tokio::test]
    async fn unscripted_ops_use_fallback_then_unreachable() {
        let transport = ScriptedTransport::with_kind(TransportKind::Relay);
        let request = TransportRequest::new(EndpointOp::FleetStatus {
            vehicle_id: Some(VehicleId::new(1)),
        });
        let outcome = transport.execute(&request).await;
        assert!(matches!(outcome, Err(TransportFailure::Unreachable(_))));

        transport.set_fallback(Err(TransportFailure::NoServer));
        assert_eq!(transport.execute(&request).await, Err(TransportFailure::NoServer));
        assert_eq!(transport.kind(), TransportKind::Relay);
        assert_eq!(transport.call_ops(), vec![OpId::FleetStatus, OpId::FleetStatus]);
    }

    #[tokio::test]
    async fn clones_share_call_log() {
        let transport = ScriptedTransport::new();
        let observer = transport.clone();
        transport.set_fallback(Ok(Vec::new()));
        let _ = transport.execute(&TransportRequest::new(EndpointOp::LaunchesNext)).await;
        assert_eq!(observer.calls().len(), 1);
        observer.clear_calls();
        assert!(transport.calls().is_empty());
    }
}

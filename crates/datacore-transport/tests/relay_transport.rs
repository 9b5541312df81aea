//! Relay transport tests for datacore-transport.
// crates/datacore-transport/tests/relay_transport.rs
// ============================================================================
// Module: Relay Transport Tests
// Description: Relay transport, paired link, and relay host behavior.
// Purpose: Ensure relayed requests round-trip and session faults are unreachable.
// Dependencies: datacore-transport, datacore-core, tokio
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use datacore_core::EndpointOp;
use datacore_core::IntervalId;
use datacore_core::MonthNumber;
use datacore_core::OpId;
use datacore_core::RelayReply;
use datacore_core::Transport;
use datacore_core::TransportFailure;
use datacore_core::TransportKind;
use datacore_core::TransportRequest;
use datacore_core::VehicleId;
use datacore_transport::ActivationState;
use datacore_transport::RelayHost;
use datacore_transport::RelayLink;
use datacore_transport::RelaySession;
use datacore_transport::RelayTransport;
use datacore_transport::ScriptedTransport;
use serde_json::json;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Returns one representative request per catalog op.
fn representative(op: OpId) -> EndpointOp {
    match op {
        OpId::FleetStatus => EndpointOp::FleetStatus {
            vehicle_id: Some(VehicleId::new(3)),
        },
        OpId::Vehicles => EndpointOp::Vehicles,
        OpId::UpdateInterval => EndpointOp::UpdateInterval {
            interval_id: IntervalId::new(42),
        },
        OpId::FuelStats => EndpointOp::FuelStats {
            vehicle_id: None,
        },
        OpId::CreateFuelLog => EndpointOp::CreateFuelLog {
            vehicle_id: VehicleId::new(1),
        },
        OpId::LaunchesNext => EndpointOp::LaunchesNext,
        OpId::LaunchesUpcoming => EndpointOp::LaunchesUpcoming,
        OpId::WorkHoursYear => EndpointOp::WorkHoursYear {
            year: 2026,
        },
        OpId::WorkHoursUpdateMonth => EndpointOp::WorkHoursUpdateMonth {
            year: 2026,
            month: MonthNumber::new(10).unwrap(),
        },
    }
}

/// Pairs a relay transport with a host serving through `direct`.
fn relay_with_host(direct: &ScriptedTransport) -> RelayTransport {
    let (watch_end, host_session) = RelayLink::pair(Duration::from_secs(5));
    let host = RelayHost::new(Arc::new(direct.clone()));
    tokio::spawn(async move { host.serve(host_session).await });
    RelayTransport::new(Arc::new(watch_end.session))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn inactive_session_is_unreachable() {
    let (watch_end, host_session) = RelayLink::pair(Duration::from_secs(5));
    assert_eq!(host_session.activation_state(), ActivationState::NotActivated);
    let relay = RelayTransport::new(Arc::new(watch_end.session.clone()));
    assert_eq!(relay.kind(), TransportKind::Relay);

    let outcome = relay.execute(&TransportRequest::new(EndpointOp::Vehicles)).await;
    assert!(matches!(outcome, Err(TransportFailure::Unreachable(_))));

    host_session.activate();
    assert!(watch_end.session.is_reachable());
    host_session.deactivate();
    assert!(!watch_end.session.is_reachable());
}

#[tokio::test]
async fn dropped_host_is_unreachable() {
    let (watch_end, host_session) = RelayLink::pair(Duration::from_secs(5));
    host_session.activate();
    drop(host_session);
    let relay = RelayTransport::new(Arc::new(watch_end.session));
    let outcome = relay.execute(&TransportRequest::new(EndpointOp::Vehicles)).await;
    assert!(matches!(outcome, Err(TransportFailure::Unreachable(_))));
}

#[tokio::test]
async fn relayed_request_returns_host_bytes() {
    let direct = ScriptedTransport::with_kind(TransportKind::Direct);
    direct.set_default(OpId::FleetStatus, Ok(br#"{"vehicleSummaries":[]}"#.to_vec()));
    let relay = relay_with_host(&direct);

    let request = TransportRequest::new(representative(OpId::FleetStatus));
    let bytes = relay.execute(&request).await.unwrap();
    assert_eq!(bytes, br#"{"vehicleSummaries":[]}"#.to_vec());

    let calls = direct.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, request.endpoint);
}

#[tokio::test]
async fn every_op_survives_the_relay_hop() {
    let direct = ScriptedTransport::with_kind(TransportKind::Direct);
    direct.set_fallback(Ok(b"{}".to_vec()));
    let relay = relay_with_host(&direct);

    for op in OpId::ALL {
        let request = match op {
            OpId::UpdateInterval => TransportRequest::with_body(
                representative(op),
                &json!({"last_service_date": "2026-10-17"}),
            )
            .unwrap(),
            _ => TransportRequest::new(representative(op)),
        };
        relay.execute(&request).await.unwrap();
        let forwarded = direct.calls().pop().unwrap();
        assert_eq!(forwarded, request, "relay rebuilt a different request for {op}");
    }
    assert_eq!(direct.calls().len(), OpId::ALL.len());
}

#[tokio::test]
async fn host_failure_is_relay_remote_failure() {
    let direct = ScriptedTransport::with_kind(TransportKind::Direct);
    direct.set_fallback(Err(TransportFailure::HttpError {
        status: Some(503),
        message: "Service Unavailable".to_string(),
    }));
    let relay = relay_with_host(&direct);

    let outcome = relay.execute(&TransportRequest::new(EndpointOp::LaunchesNext)).await;
    match outcome {
        Err(TransportFailure::RelayRemoteFailure(message)) => {
            assert!(message.starts_with("httpError"), "unexpected message {message}");
        }
        other => panic!("expected relay remote failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn missing_reply_times_out_as_unreachable() {
    let (watch_end, mut host_session) = RelayLink::pair(Duration::from_secs(30));
    host_session.activate();
    let relay = RelayTransport::new(Arc::new(watch_end.session));
    let pending = tokio::spawn(async move {
        relay.execute(&TransportRequest::new(EndpointOp::Vehicles)).await
    });

    let held = host_session.next_message().await.unwrap();
    let outcome = pending.await.unwrap();
    assert_eq!(outcome, Err(TransportFailure::Unreachable("reply timed out".to_string())));
    drop(held);
}

#[tokio::test]
async fn dropped_reply_is_unreachable() {
    let (watch_end, mut host_session) = RelayLink::pair(Duration::from_secs(30));
    host_session.activate();
    let relay = RelayTransport::new(Arc::new(watch_end.session));
    let pending = tokio::spawn(async move {
        relay.execute(&TransportRequest::new(EndpointOp::Vehicles)).await
    });

    let message = host_session.next_message().await.unwrap();
    drop(message);
    let outcome = pending.await.unwrap();
    assert_eq!(
        outcome,
        Err(TransportFailure::Unreachable("message dropped without reply".to_string()))
    );
}

#[tokio::test]
async fn host_rejects_malformed_messages() {
    let host = RelayHost::new(Arc::new(ScriptedTransport::new()));

    let reply: RelayReply =
        serde_json::from_slice(&host.handle_message(br#"{"request":"teleport"}"#).await).unwrap();
    assert!(reply.data.is_none());
    assert!(reply.error.is_some());

    let reply: RelayReply =
        serde_json::from_slice(&host.handle_message(br#"{"request":"createFuelLog"}"#).await)
            .unwrap();
    let error = reply.error.unwrap();
    assert!(error.contains("vehicleId"), "unexpected error {error}");

    let reply: RelayReply =
        serde_json::from_slice(&host.handle_message(b"not json").await).unwrap();
    assert!(reply.error.is_some());
}

#[tokio::test]
async fn garbled_reply_is_decode_failure() {
    let (watch_end, mut host_session) = RelayLink::pair(Duration::from_secs(5));
    host_session.activate();
    let relay = RelayTransport::new(Arc::new(watch_end.session));
    let pending = tokio::spawn(async move {
        relay.execute(&TransportRequest::new(EndpointOp::Vehicles)).await
    });
    let message = host_session.next_message().await.unwrap();
    message.reply(b"<html>".to_vec());
    assert!(matches!(pending.await.unwrap(), Err(TransportFailure::Decode(_))));
}

#[tokio::test(start_paused = true)]
async fn host_serves_concurrent_requests_independently() {
    let direct =
        ScriptedTransport::with_kind(TransportKind::Direct).with_delay(Duration::from_secs(2));
    direct.set_fallback(Ok(b"{}".to_vec()));
    let relay = relay_with_host(&direct);
    let started = tokio::time::Instant::now();

    let requests: Vec<TransportRequest> = [
        EndpointOp::Vehicles,
        EndpointOp::LaunchesNext,
        EndpointOp::LaunchesUpcoming,
        EndpointOp::FleetStatus {
            vehicle_id: None,
        },
        EndpointOp::FuelStats {
            vehicle_id: None,
        },
        EndpointOp::WorkHoursYear {
            year: 2026,
        },
    ]
    .into_iter()
    .map(TransportRequest::new)
    .collect();
    let outcomes = execute_concurrently(&relay, &requests).await;

    for outcome in &outcomes {
        assert_eq!(outcome, &Ok(b"{}".to_vec()));
    }
    assert_eq!(direct.calls().len(), requests.len());
    assert!(started.elapsed() < Duration::from_secs(5), "replies were serialized");
}

/// Runs every request through `relay` at once and collects the outcomes in order.
async fn execute_concurrently(
    relay: &RelayTransport,
    requests: &[TransportRequest],
) -> Vec<Result<Vec<u8>, TransportFailure>> {
    let (a, b, c, d, e, f) = tokio::join!(
        relay.execute(&requests[0]),
        relay.execute(&requests[1]),
        relay.execute(&requests[2]),
        relay.execute(&requests[3]),
        relay.execute(&requests[4]),
        relay.execute(&requests[5]),
    );
    vec![a, b, c, d, e, f]
}

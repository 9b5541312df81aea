// crates/datacore-transport/src/relay.rs
// ============================================================================
// Module: Relay Transport
// Description: Transport that delegates catalog requests to the paired host.
// Purpose: Provide the fallback path when direct HTTP is unavailable.
// Dependencies: datacore-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`RelayTransport`] never touches the network. It encodes the request as a
//! `{ request, params }` envelope, sends it over a [`RelaySession`], and
//! decodes the `{ data }` / `{ error }` reply. Any session error, including
//! an inactive session or a missed reply deadline, is `unreachable`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use datacore_core::RelayReply;
use datacore_core::RelayRequest;
use datacore_core::Transport;
use datacore_core::TransportFailure;
use datacore_core::TransportKind;
use datacore_core::TransportOutcome;
use datacore_core::TransportRequest;
use thiserror::Error;

// ============================================================================
// SECTION: Session Contract
// ============================================================================

/// Session errors reported by a relay session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelaySessionError {
    /// The paired host has not activated the session.
    #[error("session not activated")]
    NotActivated,
    /// The session channel is closed.
    #[error("session closed")]
    Closed,
    /// The paired host did not reply within the reply timeout.
    #[error("reply timed out")]
    ReplyTimeout,
    /// The paired host dropped the message without replying.
    #[error("message dropped without reply")]
    Dropped,
}

/// Point-to-point message session with the paired host.
#[async_trait]
pub trait RelaySession: Send + Sync {
    /// Returns true when a message can currently be delivered.
    fn is_reachable(&self) -> bool;

    /// Sends one message and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`RelaySessionError`] when the message cannot be delivered or
    /// no reply arrives.
    async fn send_message(&self, message: Vec<u8>) -> Result<Vec<u8>, RelaySessionError>;
}

// ============================================================================
// SECTION: Relay Transport
// ============================================================================

/// Transport delegating every request to the paired host.
#[derive(Clone)]
pub struct RelayTransport {
    /// Session used to reach the paired host.
    session: Arc<dyn RelaySession>,
}

impl RelayTransport {
    /// Creates a relay transport over a session.
    #[must_use]
    pub fn new(session: Arc<dyn RelaySession>) -> Self {
        Self {
            session,
        }
    }
}

#[async_trait]
impl Transport for RelayTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Relay
    }

    async fn execute(&self, request: &TransportRequest) -> TransportOutcome {
        if !self.session.is_reachable() {
            return Err(TransportFailure::Unreachable(RelaySessionError::NotActivated.to_string()));
        }
        let envelope = RelayRequest::from_request(request);
        let message = serde_json::to_vec(&envelope)
            .map_err(|err| TransportFailure::Decode(format!("relay request encoding: {err}")))?;
        let reply = self
            .session
            .send_message(message)
            .await
            .map_err(|err| TransportFailure::Unreachable(err.to_string()))?;
        let reply: RelayReply = serde_json::from_slice(&reply)
            .map_err(|err| TransportFailure::Decode(format!("relay reply: {err}")))?;
        reply.into_outcome()
    }
}

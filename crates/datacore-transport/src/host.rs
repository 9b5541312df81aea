// crates/datacore-transport/src/host.rs
// ============================================================================
// Module: Relay Host
// Description: Paired-host message handler executing relayed catalog calls.
// Purpose: Answer watch relay requests with its own direct transport.
// Dependencies: datacore-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`RelayHost`] is the paired-host collaborator of the relay transport. For
//! every message it decodes `{ request, params }`, rebuilds the endpoint from
//! the closed op-id set, executes it through its own transport, and replies
//! `{ data }` or `{ error }`. Malformed messages get an error reply; the host
//! never drops a message silently.
//!
//! Each message is served on its own task, so a slow request never delays
//! the replies to requests that arrived after it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use datacore_core::RelayReply;
use datacore_core::RelayRequest;
use datacore_core::Transport;
use tokio::task::JoinSet;

use crate::link::HostSession;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reply sent when the reply envelope itself cannot be encoded.
const ENCODING_FAILURE_REPLY: &[u8] = br#"{"error":"relay reply encoding failed"}"#;

// ============================================================================
// SECTION: Relay Host
// ============================================================================

/// Message handler on the paired host.
#[derive(Clone)]
pub struct RelayHost {
    /// Transport executing relayed requests.
    transport: Arc<dyn Transport>,
}

impl RelayHost {
    /// Creates a host answering through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
        }
    }

    /// Handles one encoded relay message and returns the encoded reply.
    pub async fn handle_message(&self, payload: &[u8]) -> Vec<u8> {
        let reply = match RelayRequest::from_slice(payload)
            .and_then(|envelope| envelope.to_transport_request())
        {
            Ok(request) => RelayReply::from(self.transport.execute(&request).await),
            Err(err) => RelayReply::failure(err.to_string()),
        };
        serde_json::to_vec(&reply).unwrap_or_else(|_| ENCODING_FAILURE_REPLY.to_vec())
    }

    /// Serves messages until every watch handle is dropped.
    ///
    /// The session is activated before the first message is read. Messages
    /// are handled concurrently; in-flight replies finish before returning.
    pub async fn serve(&self, mut session: HostSession) {
        session.activate();
        let mut in_flight = JoinSet::new();
        while let Some(message) = session.next_message().await {
            while in_flight.try_join_next().is_some() {}
            let host = self.clone();
            in_flight.spawn(async move {
                let reply = host.handle_message(message.payload()).await;
                message.reply(reply);
            });
        }
        while in_flight.join_next().await.is_some() {}
    }
}

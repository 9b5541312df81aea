// crates/datacore-transport/src/link.rs
// ============================================================================
// Module: Relay Link
// Description: In-process point-to-point session between watch and host.
// Purpose: Carry relay messages and queued config pushes between the peers.
// Dependencies: datacore-core, tokio
// ============================================================================

//! ## Overview
//! [`RelayLink::pair`] creates both ends of a paired session:
//! - [`WatchSession`] implements [`RelaySession`] for the relay transport.
//! - [`HostSession`] receives messages and answers each through its reply
//!   slot.
//! - A queued user-info channel carries [`ConfigPush`] values from host to
//!   watch, delivered in order.
//!
//! The host controls activation. Messages are only accepted while the host
//! reports [`ActivationState::Activated`]; user-info transfers queue
//! regardless and are drained by the watch when it runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use datacore_core::ConfigPush;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;

use crate::relay::RelaySession;
use crate::relay::RelaySessionError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of in-flight messages queued toward the host.
const MESSAGE_QUEUE_DEPTH: usize = 32;

// ============================================================================
// SECTION: Activation
// ============================================================================

/// Session activation state reported by the paired host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// The session was never activated.
    NotActivated,
    /// The session was activated and later suspended.
    Inactive,
    /// The session accepts messages.
    Activated,
}

// ============================================================================
// SECTION: Link
// ============================================================================

/// One relay message awaiting a reply.
#[derive(Debug)]
struct Envelope {
    /// Encoded request message.
    payload: Vec<u8>,
    /// Reply slot for the sender.
    reply: oneshot::Sender<Vec<u8>>,
}

/// Factory for paired session ends.
#[derive(Debug, Clone, Copy)]
pub struct RelayLink;

impl RelayLink {
    /// Creates a connected watch/host session pair.
    ///
    /// `reply_timeout` bounds how long the watch waits for each reply.
    #[must_use]
    pub fn pair(reply_timeout: Duration) -> (WatchEndpoint, HostSession) {
        let (message_tx, message_rx) = mpsc::channel(MESSAGE_QUEUE_DEPTH);
        let (activation_tx, activation_rx) = watch::channel(ActivationState::NotActivated);
        let (user_info_tx, user_info_rx) = mpsc::unbounded_channel();
        let watch_end = WatchEndpoint {
            session: WatchSession {
                messages: message_tx,
                activation: activation_rx,
                reply_timeout,
            },
            user_info: UserInfoInbox {
                receiver: user_info_rx,
            },
        };
        let host_end = HostSession {
            messages: message_rx,
            activation: activation_tx,
            user_info: UserInfoSender {
                sender: user_info_tx,
            },
        };
        (watch_end, host_end)
    }
}

/// Watch side of a paired link.
#[derive(Debug)]
pub struct WatchEndpoint {
    /// Message session used by the relay transport.
    pub session: WatchSession,
    /// Queued config pushes from the host.
    pub user_info: UserInfoInbox,
}

// ============================================================================
// SECTION: Watch Session
// ============================================================================

/// Watch end of the message session.
#[derive(Debug, Clone)]
pub struct WatchSession {
    /// Outbound message queue.
    messages: mpsc::Sender<Envelope>,
    /// Host-controlled activation state.
    activation: watch::Receiver<ActivationState>,
    /// Deadline for each reply.
    reply_timeout: Duration,
}

impl WatchSession {
    /// Returns the current activation state.
    #[must_use]
    pub fn activation_state(&self) -> ActivationState {
        *self.activation.borrow()
    }
}

#[async_trait]
impl RelaySession for WatchSession {
    fn is_reachable(&self) -> bool {
        self.activation_state() == ActivationState::Activated && !self.messages.is_closed()
    }

    async fn send_message(&self, message: Vec<u8>) -> Result<Vec<u8>, RelaySessionError> {
        if self.activation_state() != ActivationState::Activated {
            return Err(RelaySessionError::NotActivated);
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.messages
            .send(Envelope {
                payload: message,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelaySessionError::Closed)?;
        match tokio::time::timeout(self.reply_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(RelaySessionError::Dropped),
            Err(_) => Err(RelaySessionError::ReplyTimeout),
        }
    }
}

// ============================================================================
// SECTION: Host Session
// ============================================================================

/// Host end of the message session.
#[derive(Debug)]
pub struct HostSession {
    /// Inbound message queue.
    messages: mpsc::Receiver<Envelope>,
    /// Activation state published to the watch.
    activation: watch::Sender<ActivationState>,
    /// Config push channel toward the watch.
    user_info: UserInfoSender,
}

impl HostSession {
    /// Activates the session so the watch may send messages.
    pub fn activate(&self) {
        self.activation.send_replace(ActivationState::Activated);
    }

    /// Suspends the session; pending messages stay queued.
    pub fn deactivate(&self) {
        self.activation.send_replace(ActivationState::Inactive);
    }

    /// Returns the current activation state.
    #[must_use]
    pub fn activation_state(&self) -> ActivationState {
        *self.activation.borrow()
    }

    /// Returns a sender for queued config pushes.
    #[must_use]
    pub fn user_info_sender(&self) -> UserInfoSender {
        self.user_info.clone()
    }

    /// Waits for the next inbound message.
    ///
    /// Returns `None` once every watch session handle is dropped.
    pub async fn next_message(&mut self) -> Option<IncomingMessage> {
        self.messages.recv().await.map(|envelope| IncomingMessage {
            payload: envelope.payload,
            reply: envelope.reply,
        })
    }
}

/// A message received by the host, with its reply slot.
#[derive(Debug)]
pub struct IncomingMessage {
    /// Encoded request message.
    payload: Vec<u8>,
    /// Reply slot for the watch.
    reply: oneshot::Sender<Vec<u8>>,
}

impl IncomingMessage {
    /// Returns the encoded request message.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Sends the reply; a watch that stopped waiting is ignored.
    pub fn reply(self, reply: Vec<u8>) {
        let _ = self.reply.send(reply);
    }
}

// ============================================================================
// SECTION: User Info Channel
// ============================================================================

/// Host-side sender for queued config pushes.
#[derive(Debug, Clone)]
pub struct UserInfoSender {
    /// Unbounded queue preserving transfer order.
    sender: mpsc::UnboundedSender<ConfigPush>,
}

impl UserInfoSender {
    /// Queues a config push for the watch.
    ///
    /// Returns false when the watch end has been dropped.
    pub fn transfer_user_info(&self, push: ConfigPush) -> bool {
        self.sender.send(push).is_ok()
    }
}

/// Watch-side queue of config pushes.
#[derive(Debug)]
pub struct UserInfoInbox {
    /// Unbounded queue preserving transfer order.
    receiver: mpsc::UnboundedReceiver<ConfigPush>,
}

impl UserInfoInbox {
    /// Waits for the next config push; `None` once the host is gone.
    pub async fn recv(&mut self) -> Option<ConfigPush> {
        self.receiver.recv().await
    }

    /// Returns the next queued push without waiting.
    pub fn try_recv(&mut self) -> Option<ConfigPush> {
        self.receiver.try_recv().ok()
    }
}

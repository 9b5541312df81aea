// crates/datacore-transport/src/lib.rs
// ============================================================================
// Module: Datacore Transport Library
// Description: Direct, relay, and scripted implementations of Transport.
// Purpose: Execute catalog requests with interchangeable transports.
// Dependencies: datacore-config, datacore-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Every transport here implements [`datacore_core::Transport`]:
//! - [`DirectTransport`] performs HTTP from this process.
//! - [`RelayTransport`] delegates to the paired host over a [`RelaySession`].
//! - [`ScriptedTransport`] answers from in-memory scripts.
//!
//! The paired-host side lives here too: [`RelayLink`] builds an in-process
//! session pair, [`RelayHost`] answers relayed requests, and
//! [`ConfigPushDelegate`] applies pushed server addresses on the watch.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod direct;
pub mod host;
pub mod link;
pub mod push;
pub mod relay;
pub mod scripted;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use direct::DEFAULT_MAX_RESPONSE_BYTES;
pub use direct::DirectTransport;
pub use direct::DirectTransportError;
pub use host::RelayHost;
pub use link::ActivationState;
pub use link::HostSession;
pub use link::IncomingMessage;
pub use link::RelayLink;
pub use link::UserInfoInbox;
pub use link::UserInfoSender;
pub use link::WatchEndpoint;
pub use link::WatchSession;
pub use push::AppliedPush;
pub use push::ConfigPushDelegate;
pub use relay::RelaySession;
pub use relay::RelaySessionError;
pub use relay::RelayTransport;
pub use scripted::ScriptedTransport;

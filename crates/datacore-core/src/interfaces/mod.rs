// crates/datacore-core/src/interfaces/mod.rs
// ============================================================================
// Module: Datacore Interfaces
// Description: Transport and cache contracts shared by every component.
// Purpose: Let the coordinator drive any transport and any cache backend.
// Dependencies: async-trait, serde, thiserror, crate::core
// ============================================================================

//! ## Overview
//! Two seams carry the companion core. A [`Transport`] executes one catalog
//! request and yields raw bytes or a [`TransportFailure`] value; the direct
//! and relay transports implement the same trait. A [`CacheStore`] holds the
//! last successful bytes per [`CacheKey`] plus the global refresh mark.
//!
//! Transport failures are values, never panics: the coordinator inspects
//! them to drive fallback and cache policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::cache::CacheKey;
use crate::core::cache::CachedItem;
use crate::core::clock::Timestamp;
use crate::core::request::TransportRequest;

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Which transport produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// HTTP from the current process.
    Direct,
    /// Delegated to the paired host.
    Relay,
    /// In-memory transport used by tests and demos.
    Scripted,
}

impl TransportKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Relay => "relay",
            Self::Scripted => "scripted",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one transport attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    /// No base address is configured.
    #[error("No server configured.")]
    NoServer,
    /// Request URL could not be composed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Server answered outside 2xx, or the connection failed before a status.
    #[error("http error{}: {message}", status.map(|code| format!(" {code}")).unwrap_or_default())]
    HttpError {
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// Short description.
        message: String,
    },
    /// Transport hit its timeout window.
    #[error("request timed out")]
    Timeout,
    /// Bytes arrived but did not match the expected shape.
    #[error("decode failure: {0}")]
    Decode(String),
    /// Relay session is not reachable.
    #[error("paired host unreachable: {0}")]
    Unreachable(String),
    /// Paired host replied with an error envelope.
    #[error("paired host reported: {0}")]
    RelayRemoteFailure(String),
}

impl TransportFailure {
    /// Returns the failure kind label used in events and relay replies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoServer => "noServer",
            Self::InvalidUrl(_) => "invalidURL",
            Self::HttpError {
                ..
            } => "httpError",
            Self::Timeout => "timeout",
            Self::Decode(_) => "decode",
            Self::Unreachable(_) => "unreachable",
            Self::RelayRemoteFailure(_) => "relayRemoteFailure",
        }
    }

    /// Returns true when the failure was decided before any bytes left the device.
    #[must_use]
    pub const fn is_pre_send(&self) -> bool {
        matches!(self, Self::NoServer | Self::InvalidUrl(_))
    }
}

/// Result of one transport attempt: raw response bytes or a failure value.
pub type TransportOutcome = Result<Vec<u8>, TransportFailure>;

/// Executes catalog requests.
///
/// # Invariants
/// - Implementations hold no shared mutable request state and are reentrant.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns which transport this is.
    fn kind(&self) -> TransportKind;

    /// Executes one request.
    async fn execute(&self, request: &TransportRequest) -> TransportOutcome;
}

// ============================================================================
// SECTION: Cache Store
// ============================================================================

/// Cache store errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Store I/O error.
    #[error("cache store io error: {0}")]
    Io(String),
    /// Stored data is corrupted.
    #[error("cache store corruption: {0}")]
    Corrupt(String),
    /// Store is opened without write access.
    #[error("cache store is read-only")]
    ReadOnly,
    /// Store reported an error.
    #[error("cache store error: {0}")]
    Store(String),
}

/// Durable key to bytes store shared with complication renderers.
///
/// # Invariants
/// - Entries are replaced atomically; a reader sees the old or new bytes.
/// - The refresh mark never moves backward.
pub trait CacheStore: Send + Sync {
    /// Loads the cached item for a key; absent or incompatible entries are `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    fn get(&self, key: CacheKey) -> Result<Option<CachedItem>, CacheError>;

    /// Replaces the bytes stored for a key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the write fails.
    fn put(&self, key: CacheKey, bytes: &[u8], written_at: Timestamp) -> Result<(), CacheError>;

    /// Removes a single key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the delete fails.
    fn clear(&self, key: CacheKey) -> Result<(), CacheError>;

    /// Returns the global refresh mark.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    fn refresh_mark(&self) -> Result<Option<Timestamp>, CacheError>;

    /// Advances the refresh mark; earlier timestamps are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the write fails.
    fn set_refresh_mark(&self, mark: Timestamp) -> Result<(), CacheError>;
}

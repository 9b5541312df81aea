// crates/datacore-sync/src/events.rs
// ============================================================================
// Module: Sync Events
// Description: Structured events for refresh, hydration, mutation, and wakeups.
// Purpose: Emit JSON-line diagnostics without a logging framework.
// Dependencies: datacore-config, datacore-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every observable step of the companion core is reported as a
//! [`SyncEvent`] to a [`SyncEventSink`]. Sinks write one JSON object per
//! line. Events carry keys, kinds, and sizes; response bodies are never
//! logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use datacore_config::LogSinkKind;
use datacore_config::LoggingConfig;
use datacore_core::CacheKey;
use datacore_core::OpId;
use datacore_core::TransportKind;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Sync event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event body, tagged by `event`.
    #[serde(flatten)]
    pub detail: SyncEventDetail,
}

impl SyncEvent {
    /// Creates an event stamped with the current wall clock.
    #[must_use]
    pub fn new(detail: SyncEventDetail) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            detail,
        }
    }
}

/// Event bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEventDetail {
    /// Cache read performed before any refresh.
    Hydrate {
        /// Cache key read.
        key: CacheKey,
        /// Read result.
        status: HydrateStatus,
    },
    /// One keyed refresh attempt.
    Refresh {
        /// Cache key refreshed.
        key: CacheKey,
        /// Transport that produced the final outcome.
        transport: Option<TransportKind>,
        /// Refresh result label.
        outcome: &'static str,
        /// Failure kind label when the refresh failed.
        failure_kind: Option<&'static str>,
        /// Failure kind of the direct attempt when relay was used.
        direct_failure: Option<&'static str>,
        /// Response size in bytes.
        bytes: usize,
    },
    /// Group refresh completion.
    LoadAll {
        /// Keys stored.
        stored: usize,
        /// Keys failed.
        failed: usize,
        /// Whether the refresh mark advanced.
        marked: bool,
        /// Whether the group was cancelled.
        cancelled: bool,
    },
    /// Mutation attempt.
    Mutation {
        /// Catalog operation.
        op: OpId,
        /// Whether the server accepted the mutation.
        succeeded: bool,
        /// Failure kind label when the mutation failed.
        failure_kind: Option<&'static str>,
        /// Reads re-fetched after success.
        refreshed: Vec<CacheKey>,
    },
    /// Cache backend error; the operation continued without the cache.
    CacheError {
        /// Key involved, when the error is keyed.
        key: Option<CacheKey>,
        /// Error message.
        message: String,
    },
    /// Scheduler state transition.
    Scheduler {
        /// New state label.
        state: &'static str,
        /// Next wakeup (unix milliseconds) when scheduled.
        next_wakeup_ms: Option<i64>,
    },
    /// Config push applied from the paired host.
    ConfigPush {
        /// Whether the stored address changed.
        changed: bool,
        /// Whether the push cleared the address.
        cleared: bool,
        /// Validation error when the push was rejected.
        error: Option<String>,
    },
}

/// Hydration result for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrateStatus {
    /// Cached bytes decoded and were published.
    Hit,
    /// No cached entry.
    Miss,
    /// Cached bytes failed to decode and were treated as absent.
    Stale,
    /// The cache backend failed.
    Error,
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for sync events.
pub trait SyncEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &SyncEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl SyncEventSink for StderrEventSink {
    fn record(&self, event: &SyncEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SyncEventSink for FileEventSink {
    fn record(&self, event: &SyncEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards events.
pub struct NoopEventSink;

impl SyncEventSink for NoopEventSink {
    fn record(&self, _event: &SyncEvent) {}
}

/// Sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in order.
    events: Mutex<Vec<SyncEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the recorded event bodies.
    #[must_use]
    pub fn details(&self) -> Vec<SyncEventDetail> {
        self.events().into_iter().map(|event| event.detail).collect()
    }
}

impl SyncEventSink for MemoryEventSink {
    fn record(&self, event: &SyncEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}

/// Builds the sink selected by the logging config.
///
/// # Errors
///
/// Returns an error when the file sink cannot be opened or has no path.
pub fn build_event_sink(config: &LoggingConfig) -> io::Result<Arc<dyn SyncEventSink>> {
    match config.sink {
        LogSinkKind::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSinkKind::Disabled => Ok(Arc::new(NoopEventSink)),
        LogSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "file sink requires a path")
            })?;
            Ok(Arc::new(FileEventSink::new(path)?))
        }
    }
}

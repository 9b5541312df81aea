// crates/datacore-sync/src/scheduler.rs
// ============================================================================
// Module: Background Refresh Scheduler
// Description: Periodic wakeups driving group refreshes and timeline reloads.
// Purpose: Keep the cache and complication timelines fresh in the background.
// Dependencies: async-trait, datacore-core, tokio
// ============================================================================

//! ## Overview
//! The scheduler alternates between two states, `scheduled` and `running`.
//! Creating it schedules the first wakeup. Every run asks the coordinator to
//! refresh every key, asks the [`TimelineReloader`] to invalidate
//! complication timelines, and schedules the next wakeup before yielding,
//! whether or not any key refreshed.
//!
//! The [`WakeupPlatform`] decides when a scheduled wakeup actually fires and
//! may defer it; the scheduler never assumes exact timing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use datacore_core::Timestamp;
use tokio::sync::Notify;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::coordinator::DataCoordinator;
use crate::coordinator::LoadAllReport;
use crate::events::SyncEvent;
use crate::events::SyncEventDetail;
use crate::events::SyncEventSink;
use crate::observe::CancelToken;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default interval between background refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

// ============================================================================
// SECTION: State
// ============================================================================

/// Externally visible scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// A wakeup is requested for `at`.
    Scheduled {
        /// Requested wakeup time.
        at: Timestamp,
    },
    /// A refresh is in progress.
    Running,
}

impl SchedulerState {
    /// Returns the state label used in events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled {
                ..
            } => "scheduled",
            Self::Running => "running",
        }
    }
}

// ============================================================================
// SECTION: Platform Seams
// ============================================================================

/// Platform facility granting background wakeups.
#[async_trait]
pub trait WakeupPlatform: Send + Sync {
    /// Requests a wakeup after `delay`; replaces any pending request.
    fn schedule(&self, delay: Duration);

    /// Waits until the platform grants the pending wakeup.
    async fn wait(&self);
}

/// Complication engine hook invalidating every timeline.
pub trait TimelineReloader: Send + Sync {
    /// Asks the engine to rebuild every complication timeline.
    fn reload_all_timelines(&self);
}

/// Reloader that does nothing.
pub struct NoopTimelineReloader;

impl TimelineReloader for NoopTimelineReloader {
    fn reload_all_timelines(&self) {}
}

/// Wakeup platform backed by tokio timers.
///
/// [`TokioWakeupPlatform::wake_now`] grants the pending wakeup early.
#[derive(Debug, Default)]
pub struct TokioWakeupPlatform {
    /// Deadline of the pending wakeup.
    deadline: Mutex<Option<Instant>>,
    /// Early wake signal.
    nudge: Notify,
}

impl TokioWakeupPlatform {
    /// Creates a platform with no pending wakeup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants the pending wakeup immediately.
    pub fn wake_now(&self) {
        self.nudge.notify_one();
    }
}

#[async_trait]
impl WakeupPlatform for TokioWakeupPlatform {
    fn schedule(&self, delay: Duration) {
        let deadline = Instant::now() + delay;
        *self.deadline.lock().unwrap_or_else(PoisonError::into_inner) = Some(deadline);
    }

    async fn wait(&self) {
        let deadline = *self.deadline.lock().unwrap_or_else(PoisonError::into_inner);
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    () = tokio::time::sleep_until(deadline) => {}
                    () = self.nudge.notified() => {}
                }
            }
            None => self.nudge.notified().await,
        }
    }
}

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Background refresh scheduler.
pub struct BackgroundRefreshScheduler {
    /// Coordinator refreshed on each wakeup.
    coordinator: Arc<DataCoordinator>,
    /// Wakeup platform.
    platform: Arc<dyn WakeupPlatform>,
    /// Timeline reload hook.
    reloader: Arc<dyn TimelineReloader>,
    /// Interval between wakeups.
    interval: Duration,
    /// Event sink.
    events: Arc<dyn SyncEventSink>,
    /// Published state.
    state: watch::Sender<SchedulerState>,
}

impl BackgroundRefreshScheduler {
    /// Creates the scheduler and schedules the first wakeup.
    #[must_use]
    pub fn launch(
        coordinator: Arc<DataCoordinator>,
        platform: Arc<dyn WakeupPlatform>,
        reloader: Arc<dyn TimelineReloader>,
        interval: Duration,
        events: Arc<dyn SyncEventSink>,
    ) -> Self {
        let at = wakeup_time(coordinator.clock().timestamp(), interval);
        let (state, _receiver) = watch::channel(SchedulerState::Scheduled {
            at,
        });
        let scheduler = Self {
            coordinator,
            platform,
            reloader,
            interval,
            events,
            state,
        };
        scheduler.platform.schedule(interval);
        scheduler.emit_state();
        scheduler
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Runs one background execution and reschedules.
    pub async fn run_once(&self) -> LoadAllReport {
        self.state.send_replace(SchedulerState::Running);
        self.emit_state();
        let report = self.coordinator.load_all().await;
        self.reloader.reload_all_timelines();
        self.schedule_next();
        report
    }

    /// Waits for wakeups and runs until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: &CancelToken) {
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return,
                () = self.platform.wait() => {}
            }
            self.run_once().await;
        }
    }

    /// Schedules the next wakeup one interval from now.
    fn schedule_next(&self) {
        let at = wakeup_time(self.coordinator.clock().timestamp(), self.interval);
        self.platform.schedule(self.interval);
        self.state.send_replace(SchedulerState::Scheduled {
            at,
        });
        self.emit_state();
    }

    /// Emits the current state.
    fn emit_state(&self) {
        let state = self.state();
        let next_wakeup_ms = match state {
            SchedulerState::Scheduled {
                at,
            } => Some(at.as_unix_millis()),
            SchedulerState::Running => None,
        };
        self.events.record(&SyncEvent::new(SyncEventDetail::Scheduler {
            state: state.label(),
            next_wakeup_ms,
        }));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns `now + interval` as a timestamp.
fn wakeup_time(now: Timestamp, interval: Duration) -> Timestamp {
    let delta = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
    Timestamp::from_unix_millis(now.as_unix_millis().saturating_add(delta))
}

// crates/datacore-sync/src/lib.rs
// ============================================================================
// Module: Datacore Sync Library
// Description: Data coordinator, background refresh, and complication timelines.
// Purpose: Orchestrate cache-first reads and writes for the companion.
// Dependencies: datacore-config, datacore-core, serde, tokio
// ============================================================================

//! ## Overview
//! - [`DataCoordinator`] hydrates from the persistent cache, refreshes
//!   through the direct transport with relay fallback, and runs mutations.
//! - [`BackgroundRefreshScheduler`] drives periodic group refreshes and
//!   complication reloads.
//! - [`TimelineProvider`] composes complication timelines from the cache.
//! - [`SyncEventSink`] receives structured events for every step.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod coordinator;
pub mod events;
pub mod observe;
pub mod scheduler;
pub mod timelines;
pub mod views;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use coordinator::CoordinatorState;
pub use coordinator::DataCoordinator;
pub use coordinator::LOG_FUEL_FAILED;
pub use coordinator::LOG_HOURS_FAILED;
pub use coordinator::LoadAllReport;
pub use coordinator::MARK_SERVICE_FAILED;
pub use coordinator::RefreshOutcome;
pub use events::FileEventSink;
pub use events::HydrateStatus;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use events::SyncEvent;
pub use events::SyncEventDetail;
pub use events::SyncEventSink;
pub use events::build_event_sink;
pub use observe::CancelToken;
pub use observe::Observable;
pub use scheduler::BackgroundRefreshScheduler;
pub use scheduler::DEFAULT_REFRESH_INTERVAL;
pub use scheduler::NoopTimelineReloader;
pub use scheduler::SchedulerState;
pub use scheduler::TimelineReloader;
pub use scheduler::TokioWakeupPlatform;
pub use scheduler::WakeupPlatform;
pub use timelines::Complication;
pub use timelines::LAUNCHED;
pub use timelines::PLACEHOLDER;
pub use timelines::ReloadPolicy;
pub use timelines::Timeline;
pub use timelines::TimelineEntry;
pub use timelines::TimelineProvider;
pub use timelines::UnknownComplication;

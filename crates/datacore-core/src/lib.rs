// crates/datacore-core/src/lib.rs
// ============================================================================
// Module: Datacore Core Library
// Description: Public API surface for the Datacore companion core.
// Purpose: Expose catalog types, payloads, interfaces, and in-memory helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Datacore core holds the value types and contracts of the companion
//! data-access layer: the endpoint catalog, server payload views, cache keys,
//! relay wire messages, and the [`Transport`] and [`CacheStore`] seams. It
//! performs no I/O itself; transports, stores, and the coordinator live in
//! sibling crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CacheError;
pub use interfaces::CacheStore;
pub use interfaces::Transport;
pub use interfaces::TransportFailure;
pub use interfaces::TransportKind;
pub use interfaces::TransportOutcome;
pub use runtime::InMemoryCacheStore;

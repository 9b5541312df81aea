// crates/datacore-core/src/runtime/mod.rs
// ============================================================================
// Module: Datacore Runtime Helpers
// Description: In-process implementations of the core interfaces.
// Purpose: Back tests and demos without a durable store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime helpers implement the core interfaces entirely in memory.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::InMemoryCacheStore;

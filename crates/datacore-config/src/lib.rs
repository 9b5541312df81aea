// crates/datacore-config/src/lib.rs
// ============================================================================
// Module: Datacore Config Library
// Description: Companion config model, validation, and shared config store.
// Purpose: Single source of truth for datacore-companion.toml semantics.
// Dependencies: datacore-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `datacore-config` defines the companion configuration model with strict,
//! fail-closed validation, and the process-wide [`SharedConfigStore`] that
//! transports read the server base address from.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod shared;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use shared::SharedConfig;
pub use shared::SharedConfigStore;

// crates/datacore-store-sqlite/src/lib.rs
// ============================================================================
// Module: Datacore SQLite Cache
// Description: Durable SQLite-backed CacheStore for the shared container.
// Purpose: Persist payloads across launches for the app and its renderers.
// Dependencies: datacore-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteCacheStore`], a WAL-mode `SQLite` cache used
//! by the companion app (read-write) and complication renderers (read-only).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::DEFAULT_BUSY_TIMEOUT_MS;
pub use store::MAX_ENTRY_BYTES;
pub use store::SchemaStatus;
pub use store::SqliteCacheConfig;
pub use store::SqliteCacheError;
pub use store::SqliteCacheStore;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;

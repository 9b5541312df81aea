// crates/datacore-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Cache Store
// Description: Simple in-memory cache store for tests and demos.
// Purpose: Provide a deterministic cache implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`CacheStore`] for
//! tests and local demos. It also records the order of writes so callers can
//! assert which keys were persisted. It is not shared across processes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::cache::CacheKey;
use crate::core::cache::CachedItem;
use crate::core::cache::EncodingTag;
use crate::core::clock::Timestamp;
use crate::interfaces::CacheError;
use crate::interfaces::CacheStore;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state behind the in-memory store.
#[derive(Debug, Default)]
struct MemoryState {
    /// Cached items by key.
    entries: BTreeMap<CacheKey, CachedItem>,
    /// Global refresh mark.
    refresh_mark: Option<Timestamp>,
    /// Keys in the order they were written.
    put_log: Vec<CacheKey>,
}

/// In-memory cache store for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCacheStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCacheStore {
    /// Creates an empty in-memory cache store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keys written so far, in write order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] when the store mutex is poisoned.
    pub fn put_log(&self) -> Result<Vec<CacheKey>, CacheError> {
        Ok(self.lock()?.put_log.clone())
    }

    /// Acquires the state lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, CacheError> {
        self.state.lock().map_err(|_| CacheError::Store("cache store mutex poisoned".to_string()))
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: CacheKey) -> Result<Option<CachedItem>, CacheError> {
        Ok(self.lock()?.entries.get(&key).cloned())
    }

    fn put(&self, key: CacheKey, bytes: &[u8], written_at: Timestamp) -> Result<(), CacheError> {
        let mut guard = self.lock()?;
        guard.entries.insert(
            key,
            CachedItem {
                bytes: bytes.to_vec(),
                encoding: EncodingTag::Json,
                written_at,
            },
        );
        guard.put_log.push(key);
        Ok(())
    }

    fn clear(&self, key: CacheKey) -> Result<(), CacheError> {
        self.lock()?.entries.remove(&key);
        Ok(())
    }

    fn refresh_mark(&self) -> Result<Option<Timestamp>, CacheError> {
        Ok(self.lock()?.refresh_mark)
    }

    fn set_refresh_mark(&self, mark: Timestamp) -> Result<(), CacheError> {
        let mut guard = self.lock()?;
        guard.refresh_mark = Some(guard.refresh_mark.map_or(mark, |current| current.max(mark)));
        Ok(())
    }
}

// crates/datacore-config/src/shared.rs
// ============================================================================
// Module: Shared Config Store
// Description: Process-wide base address and container identifier.
// Purpose: Give transports and the coordinator one readable config view.
// Dependencies: datacore-core, crate::config
// ============================================================================

//! ## Overview
//! The shared config store is read by transports on every request and
//! written only by the settings surface and the relay config-push delegate.
//! Writes replace one field atomically; readers always see a whole value.
//!
//! Reads never fail: a poisoned lock still holds the last complete value,
//! so readers recover it instead of erroring.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use datacore_core::ConfigPush;

use crate::config::CompanionConfig;
use crate::config::ConfigError;
use crate::config::validate_base_address;

// ============================================================================
// SECTION: Shared Config
// ============================================================================

/// Snapshot of the shared config mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedConfig {
    /// Server base address, when configured.
    pub base_address: Option<String>,
    /// Group container identifier.
    pub group_container_id: String,
}

impl SharedConfig {
    /// Builds the shared mapping from a loaded config.
    #[must_use]
    pub fn from_config(config: &CompanionConfig) -> Self {
        Self {
            base_address: config.server.address().map(str::to_string),
            group_container_id: config.container.group_container_id.clone(),
        }
    }
}

/// Process-wide shared config store.
#[derive(Debug, Clone)]
pub struct SharedConfigStore {
    /// Shared mapping guarded for concurrent readers.
    inner: Arc<RwLock<SharedConfig>>,
}

impl SharedConfigStore {
    /// Creates a store holding `config`.
    #[must_use]
    pub fn new(config: SharedConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Creates a store from a loaded companion config.
    #[must_use]
    pub fn from_config(config: &CompanionConfig) -> Self {
        Self::new(SharedConfig::from_config(config))
    }

    /// Returns the current base address.
    #[must_use]
    pub fn base_address(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).base_address.clone()
    }

    /// Returns the group container identifier.
    #[must_use]
    pub fn group_container_id(&self) -> String {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).group_container_id.clone()
    }

    /// Returns a copy of the whole mapping.
    #[must_use]
    pub fn snapshot(&self) -> SharedConfig {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sets or clears the base address from the settings surface.
    ///
    /// Blank addresses clear the setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address is not a valid
    /// server base address; the stored value is left unchanged.
    pub fn set_base_address(&self, address: Option<&str>) -> Result<(), ConfigError> {
        let normalized = address.map(str::trim).filter(|value| !value.is_empty());
        if let Some(value) = normalized {
            validate_base_address(value)?;
        }
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.base_address = normalized.map(str::to_string);
        Ok(())
    }

    /// Applies a config push from the paired host.
    ///
    /// Returns `true` when the stored address changed. Repeated pushes of the
    /// same value are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the pushed address is invalid.
    pub fn apply_config_push(&self, push: &ConfigPush) -> Result<bool, ConfigError> {
        let before = self.base_address();
        self.set_base_address(push.address())?;
        Ok(self.base_address() != before)
    }
}

// crates/datacore-transport/src/push.rs
// ============================================================================
// Module: Config Push Delegate
// Description: Watch-side consumer of queued config pushes.
// Purpose: Write pushed server addresses into the shared config store.
// Dependencies: datacore-config, datacore-core
// ============================================================================

//! ## Overview
//! The paired host pushes `{ serverAddress }` over the queued user-info
//! channel. [`ConfigPushDelegate`] applies each push to the
//! [`SharedConfigStore`] in delivery order. Applying the same push twice is a
//! no-op, so at-least-once delivery is safe. An invalid address leaves the
//! store unchanged and is reported to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datacore_config::ConfigError;
use datacore_config::SharedConfigStore;
use datacore_core::ConfigPush;

use crate::link::UserInfoInbox;

// ============================================================================
// SECTION: Delegate
// ============================================================================

/// Result of applying one config push.
#[derive(Debug)]
pub struct AppliedPush {
    /// The push as delivered.
    pub push: ConfigPush,
    /// `Ok(true)` when the stored address changed.
    pub result: Result<bool, ConfigError>,
}

/// Applies queued config pushes to the shared config store.
#[derive(Debug)]
pub struct ConfigPushDelegate {
    /// Store receiving pushed addresses.
    store: SharedConfigStore,
    /// Queue of pushes from the paired host.
    inbox: UserInfoInbox,
}

impl ConfigPushDelegate {
    /// Creates a delegate draining `inbox` into `store`.
    #[must_use]
    pub const fn new(store: SharedConfigStore, inbox: UserInfoInbox) -> Self {
        Self {
            store,
            inbox,
        }
    }

    /// Waits for the next push and applies it.
    ///
    /// Returns `None` once the host end is gone and the queue is empty.
    pub async fn next_applied(&mut self) -> Option<AppliedPush> {
        let push = self.inbox.recv().await?;
        Some(self.apply(push))
    }

    /// Applies every push already queued, in order, without waiting.
    pub fn drain(&mut self) -> Vec<AppliedPush> {
        let mut applied = Vec::new();
        while let Some(push) = self.inbox.try_recv() {
            applied.push(self.apply(push));
        }
        applied
    }

    /// Applies one push to the store.
    fn apply(&self, push: ConfigPush) -> AppliedPush {
        let result = self.store.apply_config_push(&push);
        AppliedPush {
            push,
            result,
        }
    }
}

// crates/datacore-sync/src/observe.rs
// ============================================================================
// Module: Observation
// Description: Watch-backed observable values and cancellation tokens.
// Purpose: Let UI and complication readers see the latest published state.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`Observable`] holds the most recently published value of one read.
//! Reading is O(1) and always yields the latest value; subscribers are woken
//! on every publish. [`CancelToken`] lets a caller abandon a refresh; the
//! coordinator races transports against it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::watch;

// ============================================================================
// SECTION: Observable
// ============================================================================

/// Latest-value cell with change notification.
#[derive(Debug)]
pub struct Observable<T> {
    /// Watch channel holding the current value.
    sender: watch::Sender<Option<T>>,
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observable<T> {
    /// Creates an empty observable.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(None);
        Self {
            sender,
        }
    }

    /// Publishes a new value, waking subscribers.
    pub fn publish(&self, value: T) {
        self.sender.send_replace(Some(value));
    }

    /// Clears the value, waking subscribers.
    pub fn clear(&self) {
        self.sender.send_replace(None);
    }

    /// Returns true once any value has been published.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Subscribes to future publications.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.sender.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    /// Returns the latest published value.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.sender.borrow().clone()
    }
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Cooperative cancellation token shared between a caller and a refresh.
#[derive(Debug, Clone)]
pub struct CancelToken {
    /// Shared cancellation flag.
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Creates an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancels every operation holding this token.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

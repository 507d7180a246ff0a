//! Subscriber types for the atom store.
//!
//! A Subscriber is a change listener registered on one atom. The binder
//! registers one subscriber per bound facet.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Each listener gets a unique ID when registered. The ID is what a
/// subscription handle uses to remove exactly its own listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked when a subscribed atom (or one of its inputs) changes.
///
/// A failing listener reports its error to whoever triggered the change.
pub type Listener = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// A listener paired with its ID.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    notify: Listener,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Arc::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber that its atom changed.
    pub fn notify(&self) -> Result<()> {
        (self.notify)()
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

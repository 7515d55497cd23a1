//! Event bus for status reporting.
//!
//! The poll orchestrator publishes [`StatusEvent`]s; presentation layers and
//! the log journal subscribe to them. Publishing never fails, and a
//! subscriber that panics is isolated from the publisher.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};

use crate::domain::JobOutcome;

/// Status events emitted by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// Human-readable status line changed.
    StatusChanged(String),
    /// A message was dispatched to the print engine.
    JobCompleted {
        subject: String,
        outcome: JobOutcome,
    },
    /// A recoverable error was reported.
    ErrorOccurred(String),
    /// A poll cycle finished; the next one is due at `next`.
    CycleTiming {
        last: DateTime<Local>,
        next: DateTime<Local>,
    },
    /// A retention sweep ran (or the store was created).
    CleanupTiming {
        last: DateTime<Local>,
        next: DateTime<Local>,
    },
    /// One second of the idle countdown elapsed.
    CountdownTick { remaining: u64, total: u64 },
}

/// Subscriber ID for unsubscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Event handler function type.
pub type EventHandler = Box<dyn Fn(&StatusEvent) + Send + Sync>;

/// Event bus for publish-subscribe communication.
///
/// Thread-safe; a display running on its own thread can subscribe while
/// the orchestrator publishes.
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<u64, EventHandler>>>,
    next_id: Arc<Mutex<u64>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(0)),
        }
    }

    /// Subscribe to all events.
    ///
    /// Returns a subscriber ID that can be used to unsubscribe.
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *next_id;
        *next_id += 1;

        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.insert(id, Box::new(handler));

        SubscriberId(id)
    }

    /// Unsubscribe from events.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.remove(&subscriber_id.0);
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: StatusEvent) {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        for (id, handler) in handlers.iter() {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::warn!(subscriber = id, "status subscriber panicked");
            }
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

//! Lifecycle event publisher for step and freeze-gate transitions.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

/// High-throughput event publisher for lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: DateTime<Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub fn publish(&self, event_name: impl Into<String>, context: Value) {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: Utc::now(),
        };

        // No subscribers is acceptable; events are observational
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::system::DEFAULT_EVENT_CAPACITY)
    }
}

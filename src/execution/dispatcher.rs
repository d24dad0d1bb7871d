//! Delegate dispatcher: queues work units for remote workers.
//!
//! The dispatcher's transport, queueing, and retry policy are external
//! collaborators; the engine only needs a correlation id back. The provided
//! [`QueuedDispatcher`] feeds an in-process channel, which is sufficient for
//! embedding and for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Opaque token linking a dispatched unit of work to its eventual result
pub type CorrelationId = Uuid;

/// A unit of work bound for a remote worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    pub correlation_id: CorrelationId,
    pub task_type: String,
    pub payload: serde_json::Value,
    pub timeout_minutes: u64,
    pub dispatched_at: DateTime<Utc>,
}

/// Errors raised while dispatching work
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Worker queue is closed")]
    QueueClosed,

    #[error("Work unit serialization failed: {message}")]
    Serialization { message: String },
}

/// Seam to the remote worker fleet
#[async_trait]
pub trait DelegateDispatcher: Send + Sync {
    /// Queue a work unit; returns the correlation id the eventual result
    /// will carry
    async fn dispatch(
        &self,
        task_type: &str,
        payload: serde_json::Value,
        timeout_minutes: u64,
    ) -> Result<CorrelationId, DispatchError>;
}

/// Channel-backed dispatcher. The receiving half is handed to whatever
/// bridges work units onto the real transport.
#[derive(Debug, Clone)]
pub struct QueuedDispatcher {
    sender: mpsc::Sender<WorkUnit>,
}

impl QueuedDispatcher {
    /// Create a dispatcher and the receiver draining its queue
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<WorkUnit>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DelegateDispatcher for QueuedDispatcher {
    async fn dispatch(
        &self,
        task_type: &str,
        payload: serde_json::Value,
        timeout_minutes: u64,
    ) -> Result<CorrelationId, DispatchError> {
        let correlation_id = Uuid::new_v4();
        let unit = WorkUnit {
            correlation_id,
            task_type: task_type.to_string(),
            payload,
            timeout_minutes,
            dispatched_at: Utc::now(),
        };

        self.sender
            .send(unit)
            .await
            .map_err(|_| DispatchError::QueueClosed)?;

        debug!(
            correlation_id = %correlation_id,
            task_type = %task_type,
            timeout_minutes = timeout_minutes,
            "Work unit dispatched"
        );
        Ok(correlation_id)
    }
}

//! Response correlator: matches inbound worker results to suspended steps.
//!
//! Results arrive as `(correlation_id, WorkerResult)` messages on a channel;
//! the correlator looks up the pending execution, reconstructs its context
//! from the persisted state snapshot, and drives the step's async
//! continuation to a terminal response. The pending entry is consumed on
//! first delivery, so a duplicate delivery finds nothing and is rejected
//! rather than reprocessed.

use super::dispatcher::CorrelationId;
use super::response::{ExecutionResponse, ExecutionStatus};
use crate::steps::{StateExecutionData, Step, StepError, StepExecutor};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Terminal result reported by a remote worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResult {
    pub correlation_id: CorrelationId,
    pub status: ExecutionStatus,
    pub output: serde_json::Value,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl WorkerResult {
    /// Successful completion with an output payload
    pub fn success(correlation_id: CorrelationId, output: serde_json::Value) -> Self {
        Self {
            correlation_id,
            status: ExecutionStatus::Success,
            output,
            error_message: None,
            completed_at: Utc::now(),
        }
    }

    /// Terminal failure with a message
    pub fn failure(correlation_id: CorrelationId, message: impl Into<String>) -> Self {
        Self {
            correlation_id,
            status: ExecutionStatus::Failed,
            output: serde_json::Value::Null,
            error_message: Some(message.into()),
            completed_at: Utc::now(),
        }
    }
}

/// A step suspended at its async boundary, awaiting one correlation id
#[derive(Debug, Clone)]
pub struct PendingExecution {
    pub step: Step,
    pub state: StateExecutionData,
    pub registered_at: DateTime<Utc>,
}

/// Errors raised during response correlation
#[derive(Error, Debug)]
pub enum CorrelationError {
    /// Stale or duplicate delivery: nothing is waiting on this id
    #[error("No pending execution for correlation id {correlation_id}")]
    NoPendingExecution { correlation_id: CorrelationId },

    /// Real inconsistency: the pending entry disagrees with its key
    #[error("Pending step mismatch for correlation id {correlation_id}: registered state carries {registered}")]
    StepMismatch {
        correlation_id: CorrelationId,
        registered: CorrelationId,
    },

    #[error("Resume failed: {0}")]
    Resume(#[from] StepError),
}

/// Matches inbound worker results to pending step executions
pub struct ResponseCorrelator {
    executor: Arc<StepExecutor>,
    pending: DashMap<CorrelationId, PendingExecution>,
}

impl ResponseCorrelator {
    pub fn new(executor: Arc<StepExecutor>) -> Self {
        Self {
            executor,
            pending: DashMap::new(),
        }
    }

    /// Register a suspended step under its state snapshot's correlation id
    pub fn register(&self, step: Step, state: StateExecutionData) {
        let correlation_id = state.correlation_id;
        self.pending.insert(
            correlation_id,
            PendingExecution {
                step,
                state,
                registered_at: Utc::now(),
            },
        );
        debug!(correlation_id = %correlation_id, "Pending execution registered");
    }

    /// Number of executions currently awaiting results
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Deliver one worker result, consuming the pending entry and driving
    /// the step's continuation to a terminal response.
    pub async fn deliver(
        &self,
        result: WorkerResult,
    ) -> Result<ExecutionResponse, CorrelationError> {
        let correlation_id = result.correlation_id;
        let (_, pending) = self.pending.remove(&correlation_id).ok_or(
            CorrelationError::NoPendingExecution { correlation_id },
        )?;

        if pending.state.correlation_id != correlation_id {
            return Err(CorrelationError::StepMismatch {
                correlation_id,
                registered: pending.state.correlation_id,
            });
        }

        // Context is reconstructed from the persisted snapshot, not carried
        // across the suspension
        let context = pending.state.restore_context();
        let mut responses = HashMap::new();
        responses.insert(correlation_id, result);

        let response = self
            .executor
            .handle_async_response(&pending.step, &context, &pending.state, &responses)
            .await?;
        Ok(response)
    }

    /// Drain a result channel until it closes, resuming steps as results
    /// arrive. Each resume runs to completion before the next receive.
    pub async fn run(&self, mut receiver: mpsc::Receiver<WorkerResult>) {
        while let Some(result) = receiver.recv().await {
            let correlation_id = result.correlation_id;
            match self.deliver(result).await {
                Ok(response) => {
                    debug!(
                        correlation_id = %correlation_id,
                        status = %response.status,
                        "Async response handled"
                    );
                }
                Err(CorrelationError::NoPendingExecution { .. }) => {
                    warn!(
                        correlation_id = %correlation_id,
                        "Dropping stale or duplicate worker result"
                    );
                }
                Err(err) => {
                    error!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "Failed to resume pending execution"
                    );
                }
            }
        }
        debug!("Worker result channel closed, correlator stopping");
    }
}

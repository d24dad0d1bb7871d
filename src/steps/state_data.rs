//! Persisted state snapshot for suspended steps.

use super::step::StepActionKind;
use crate::execution::{CorrelationId, ExecutionContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything needed to interpret a step's eventual asynchronous result.
///
/// Created at step start, persisted atomically with the awaiting
/// transition, consumed exactly once on resume, then discarded. The
/// embedded context carrier lets the correlator reconstruct the
/// [`ExecutionContext`] without any ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateExecutionData {
    pub step_id: String,
    pub step_name: String,
    pub action_kind: StepActionKind,
    pub correlation_id: CorrelationId,
    pub activity_id: Uuid,
    /// Sweeping-output name this step records under on success; `None` for
    /// non-recording and rollback actions
    pub output_name: Option<String>,
    /// Pre-computed output payload to record on success
    pub pending_output: Option<serde_json::Value>,
    pub timeout_minutes: u64,
    pub context: ExecutionContext,
    pub started_at: DateTime<Utc>,
}

impl StateExecutionData {
    /// Reconstruct the execution context for the resume continuation
    pub fn restore_context(&self) -> ExecutionContext {
        self.context.clone()
    }
}

//! Step execution responses and terminal statuses.

use super::dispatcher::CorrelationId;
use crate::steps::StateExecutionData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a step or activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Step is executing or awaiting an asynchronous result
    Running,
    /// Step reached successful completion
    Success,
    /// Step reached terminal failure
    Failed,
}

impl ExecutionStatus {
    /// Check if this is a terminal status (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid execution status: {s}")),
        }
    }
}

/// Response returned by the step lifecycle.
///
/// Synchronous steps return a terminal status directly. Asynchronous steps
/// return `is_async = true` with the correlation ids the caller must
/// register and the state snapshot needed to resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub status: ExecutionStatus,
    pub is_async: bool,
    pub correlation_ids: Vec<CorrelationId>,
    pub state_data: Option<StateExecutionData>,
    pub output: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

impl ExecutionResponse {
    /// Terminal success with an optional output payload
    pub fn success(output: Option<serde_json::Value>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            is_async: false,
            correlation_ids: Vec::new(),
            state_data: None,
            output,
            error_message: None,
        }
    }

    /// Terminal failure with a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            is_async: false,
            correlation_ids: Vec::new(),
            state_data: None,
            output: None,
            error_message: Some(message.into()),
        }
    }

    /// Suspended awaiting asynchronous results for the given correlation ids
    pub fn awaiting(correlation_ids: Vec<CorrelationId>, state_data: StateExecutionData) -> Self {
        Self {
            status: ExecutionStatus::Running,
            is_async: true,
            correlation_ids,
            state_data: Some(state_data),
            output: None,
            error_message: None,
        }
    }

    /// Check if the step completed successfully
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Check if the step failed
    pub fn is_failure(&self) -> bool {
        self.status == ExecutionStatus::Failed
    }
}

//! Step execution error types.

use crate::execution::{
    ActivityError, CorrelationId, DispatchError, RenderError, SweepingOutputError,
};
use thiserror::Error;

/// Errors raised while building or driving a step.
///
/// Request-build failures are configuration errors and surface to the
/// caller as a terminal `Failed` response; they are never retried at this
/// layer.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Missing setup output '{name}': no setup step has recorded it for this run")]
    MissingSetupOutput { name: String },

    #[error("Missing rollback source '{name}': the paired forward step recorded no output")]
    MissingRollbackSource { name: String },

    #[error("Step is not in a rollback phase: no forward phase name to pair with")]
    NotInRollbackPhase,

    #[error("Invalid step parameters: {message}")]
    InvalidParameters { message: String },

    #[error("No worker result delivered for correlation id {correlation_id}")]
    MissingResponse { correlation_id: CorrelationId },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    SweepingOutput(#[from] SweepingOutputError),

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StepError {
    /// Create an invalid-parameters error
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }
}

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RolloutError {
    StepExecutionError(String),
    CorrelationError(String),
    DispatchError(String),
    SweepingOutputError(String),
    FreezeEvaluationError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for RolloutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloutError::StepExecutionError(msg) => write!(f, "Step execution error: {msg}"),
            RolloutError::CorrelationError(msg) => write!(f, "Correlation error: {msg}"),
            RolloutError::DispatchError(msg) => write!(f, "Dispatch error: {msg}"),
            RolloutError::SweepingOutputError(msg) => write!(f, "Sweeping output error: {msg}"),
            RolloutError::FreezeEvaluationError(msg) => write!(f, "Freeze evaluation error: {msg}"),
            RolloutError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            RolloutError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for RolloutError {}

impl From<crate::steps::StepError> for RolloutError {
    fn from(err: crate::steps::StepError) -> Self {
        RolloutError::StepExecutionError(err.to_string())
    }
}

impl From<crate::execution::CorrelationError> for RolloutError {
    fn from(err: crate::execution::CorrelationError) -> Self {
        RolloutError::CorrelationError(err.to_string())
    }
}

impl From<crate::execution::SweepingOutputError> for RolloutError {
    fn from(err: crate::execution::SweepingOutputError) -> Self {
        RolloutError::SweepingOutputError(err.to_string())
    }
}

impl From<crate::freeze::FreezeError> for RolloutError {
    fn from(err: crate::freeze::FreezeError) -> Self {
        RolloutError::FreezeEvaluationError(err.to_string())
    }
}

impl From<crate::config::ConfigurationError> for RolloutError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        RolloutError::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RolloutError>;

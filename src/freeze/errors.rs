//! Freeze subsystem error types.

use thiserror::Error;

/// Errors raised by the freeze registry and evaluator.
///
/// A freeze check is a safety gate: lookup failures fail the whole
/// evaluation rather than letting a partial result read as "clear".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FreezeError {
    #[error("Freeze not found: '{identifier}'")]
    NotFound { identifier: String },

    #[error("Freeze already exists: '{identifier}'")]
    AlreadyExists { identifier: String },

    #[error("Invalid freeze timezone: '{timezone}'")]
    InvalidTimezone { timezone: String },

    #[error("Invalid freeze window: {message}")]
    InvalidWindow { message: String },

    #[error("Invalid freeze config: {message}")]
    InvalidConfig { message: String },

    #[error("Freeze YAML error: {message}")]
    Yaml { message: String },

    #[error("Freeze lookup failed at {level} level: {message}")]
    LookupFailed { level: String, message: String },
}

impl FreezeError {
    /// Create a not-found error
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create an invalid-window error
    pub fn invalid_window(message: impl Into<String>) -> Self {
        Self::InvalidWindow {
            message: message.into(),
        }
    }

    /// Create an invalid-config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a lookup-failed error for one hierarchy level
    pub fn lookup_failed(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LookupFailed {
            level: level.into(),
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for FreezeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

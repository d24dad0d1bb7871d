//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating engine configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration file not found, searched: {searched:?}")]
    FileNotFound { searched: Vec<String> },

    #[error("Failed to read configuration file {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("Failed to parse configuration file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Configuration validation failed: {field}: {message}")]
    Validation { field: String, message: String },
}

impl ConfigurationError {
    /// Create a file read error
    pub fn file_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigurationError>;

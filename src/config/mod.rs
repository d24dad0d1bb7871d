//! # Engine Configuration System
//!
//! YAML-driven configuration for the rollout engine with environment-aware
//! loading and explicit validation. Configuration comes from files under a
//! `config/` directory with per-environment overrides; there are no silent
//! fallbacks past the documented defaults.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rollout_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let timeout = manager.config().execution.default_step_timeout_minutes;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::constants::system;
pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RolloutConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub freeze: FreezeGateConfig,
}

/// Step execution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Timeout applied to dispatched work units when the step carries none
    pub default_step_timeout_minutes: u64,
    /// Capacity of the lifecycle event broadcast channel
    pub event_channel_capacity: usize,
}

/// Delegate dispatcher settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatcherConfig {
    /// Capacity of the outbound work unit queue
    pub queue_capacity: usize,
    /// Capacity of the inbound worker response channel
    pub response_channel_capacity: usize,
}

/// Freeze gate settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreezeGateConfig {
    /// When false the gate is bypassed entirely (maintenance escape hatch)
    pub enabled: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_step_timeout_minutes: system::DEFAULT_STEP_TIMEOUT_MINUTES,
            event_channel_capacity: system::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: system::DEFAULT_CHANNEL_CAPACITY,
            response_channel_capacity: system::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for FreezeGateConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl RolloutConfig {
    /// Validate the loaded configuration, rejecting values the engine
    /// cannot operate with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.execution.default_step_timeout_minutes == 0 {
            return Err(ConfigurationError::validation(
                "execution.default_step_timeout_minutes",
                "must be greater than zero",
            ));
        }
        if self.execution.event_channel_capacity == 0 {
            return Err(ConfigurationError::validation(
                "execution.event_channel_capacity",
                "must be greater than zero",
            ));
        }
        if self.dispatcher.queue_capacity == 0 {
            return Err(ConfigurationError::validation(
                "dispatcher.queue_capacity",
                "must be greater than zero",
            ));
        }
        if self.dispatcher.response_channel_capacity == 0 {
            return Err(ConfigurationError::validation(
                "dispatcher.response_channel_capacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

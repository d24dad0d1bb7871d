//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles YAML file discovery,
//! environment detection, and base-plus-override merging.

use super::error::{ConfigResult, ConfigurationError};
use super::RolloutConfig;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const BASE_CONFIG_FILE: &str = "rollout.yaml";

/// Loaded configuration together with the environment it was resolved for
pub struct ConfigManager {
    config: RolloutConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection from the default
    /// `config/` directory
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit
    /// environment, useful for testing without touching process env vars
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading engine configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Access the loaded configuration
    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    /// Environment this configuration was resolved for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Directory the configuration was loaded from
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn detect_environment() -> String {
        env::var("ROLLOUT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// Read the base file, then overlay the environment file's top-level
    /// sections when one exists. A missing base file yields defaults so a
    /// bare checkout still runs.
    fn load_and_merge_config(directory: &Path, environment: &str) -> ConfigResult<RolloutConfig> {
        let base_path = directory.join(BASE_CONFIG_FILE);
        let env_path = directory.join(format!("rollout.{environment}.yaml"));

        if !base_path.exists() && !env_path.exists() {
            debug!("No configuration files found, using built-in defaults");
            return Ok(RolloutConfig::default());
        }

        let mut merged = if base_path.exists() {
            Self::read_yaml(&base_path)?
        } else {
            YamlValue::Mapping(serde_yaml::Mapping::new())
        };

        if env_path.exists() {
            let overrides = Self::read_yaml(&env_path)?;
            Self::merge_sections(&mut merged, overrides);
        }

        serde_yaml::from_value(merged)
            .map_err(|e| ConfigurationError::parse(base_path.display().to_string(), e.to_string()))
    }

    fn read_yaml(path: &Path) -> ConfigResult<YamlValue> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::file_read(path.display().to_string(), e.to_string()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigurationError::parse(path.display().to_string(), e.to_string()))
    }

    /// Overlay top-level sections from `overrides` onto `base`
    fn merge_sections(base: &mut YamlValue, overrides: YamlValue) {
        if let (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) =
            (base, overrides)
        {
            for (key, value) in override_map {
                base_map.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        assert_eq!(manager.config(), &RolloutConfig::default());
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_override_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("rollout.yaml"),
            "execution:\n  default_step_timeout_minutes: 10\n  event_channel_capacity: 100\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("rollout.test.yaml"),
            "execution:\n  default_step_timeout_minutes: 5\n  event_channel_capacity: 100\n",
        )
        .unwrap();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        assert_eq!(manager.config().execution.default_step_timeout_minutes, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("rollout.yaml"),
            "dispatcher:\n  queue_capacity: 0\n  response_channel_capacity: 10\n",
        )
        .unwrap();

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(result.is_err());
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for cmbuild
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/cmbuild/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;

use cmbuild_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// Remote service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
    /// Case-insensitive fragment of the application's display name
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Defaults for the positional workflow and branch arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_workflow")]
    pub workflow: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Build polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64, // seconds
    /// Absent means poll until the build reaches a terminal status
    #[serde(default)]
    pub max_polls: Option<u32>,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff: u64, // seconds
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub output_dir: Option<PathBuf>,
}

// Default implementations

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            dashboard_url: default_dashboard_url(),
            app_name: default_app_name(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workflow: default_workflow(),
            branch: default_branch(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_polls: None,
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff: default_max_backoff(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300, // 5 minutes, artifacts can be large
            connect_timeout: 30,
            retries: 2,
            retry_delay: 1,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff)
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    constants::DEFAULT_API_URL.to_string()
}

fn default_dashboard_url() -> String {
    constants::DEFAULT_DASHBOARD_URL.to_string()
}

fn default_app_name() -> String {
    constants::DEFAULT_APP_NAME.to_string()
}

fn default_workflow() -> String {
    constants::DEFAULT_WORKFLOW.to_string()
}

fn default_branch() -> String {
    constants::DEFAULT_BRANCH.to_string()
}

fn default_poll_interval() -> u64 {
    constants::DEFAULT_POLL_INTERVAL_SECS
}

fn default_backoff_multiplier() -> f64 {
    constants::DEFAULT_BACKOFF_MULTIPLIER
}

fn default_max_backoff() -> u64 {
    constants::DEFAULT_MAX_BACKOFF_SECS
}

fn default_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("cmbuild").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => Self::load_from_file(&config_path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(url) = std::env::var(constants::ENV_API_URL) {
            self.api.base_url = url;
        }

        if let Ok(name) = std::env::var(constants::ENV_APP_NAME) {
            self.api.app_name = name;
        }

        if let Ok(dir) = std::env::var(constants::ENV_OUTPUT_DIR) {
            self.paths.output_dir = Some(PathBuf::from(dir));
        }

        if let Ok(interval) = std::env::var(constants::ENV_POLL_INTERVAL) {
            self.monitor.poll_interval =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: constants::ENV_POLL_INTERVAL.to_string(),
                    value: interval,
                })?;
        }

        if let Ok(polls) = std::env::var(constants::ENV_MAX_POLLS) {
            self.monitor.max_polls = Some(polls.parse().map_err(|_| ConfigError::InvalidValue {
                field: constants::ENV_MAX_POLLS.to_string(),
                value: polls,
            })?);
        }

        Ok(())
    }

    /// Check values that would make the run misbehave
    ///
    /// # Errors
    ///
    /// Returns an error for a zero poll interval, a backoff multiplier below
    /// one, a zero poll limit, or an API base URL that does not parse.
    pub fn validate(&self) -> Result<(), Error> {
        if self.monitor.poll_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.poll_interval".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.monitor.max_polls == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "monitor.max_polls".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if !self.monitor.backoff_multiplier.is_finite() || self.monitor.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.backoff_multiplier".to_string(),
                value: self.monitor.backoff_multiplier.to_string(),
            }
            .into());
        }

        for (field, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.dashboard_url", &self.api.dashboard_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                field: field.to_string(),
                value: format!("{value} ({e})"),
            })?;
        }

        Ok(())
    }

    /// Get the artifact output directory (with default)
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.paths
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_DIR))
    }

    /// Directory for debug log files
    #[must_use]
    pub fn logs_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("cmbuild")
            .join("logs")
    }
}

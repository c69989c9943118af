//! Hierarchical configuration: programmatic defaults, a project config
//! file, then `ROBOTSCHED_*` environment variables, highest wins.

use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::ExecutorMode;
use crate::services::ManagerConfig;

/// Errors surfaced validating a loaded `SchedulerConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("worker_size must be at least 1")]
    InvalidWorkerSize,

    #[error("queue_size must be at least 1")]
    InvalidQueueSize,

    #[error("tick_period_ms must be at least 1")]
    InvalidTickPeriod,

    #[error("invalid log level: {0}, must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid log format: {0}, must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("figment extraction failed: {0}")]
    Extract(#[from] figment::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

/// Top-level configuration; the `[lib]` surface wraps this into
/// `ManagerConfig` via `into_manager_config`, keeping the wire/file shape
/// (plain seconds/ms, string executor mode) independent of the runtime
/// `Duration`/enum types services consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub worker_size: usize,
    pub queue_size: usize,
    pub tick_period_ms: u64,
    pub refresh_period_secs: u64,
    pub default_executor_mode: ExecutorMode,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_size: 4,
            queue_size: 1000,
            tick_period_ms: 60_000,
            refresh_period_secs: 3600,
            default_executor_mode: ExecutorMode::Standard,
            logging: LoggingConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn into_manager_config(self) -> ManagerConfig {
        ManagerConfig {
            worker_size: self.worker_size,
            queue_size: self.queue_size,
            tick_period: Duration::from_millis(self.tick_period_ms),
            refresh_period: Duration::from_secs(self.refresh_period_secs),
            default_executor_mode: self.default_executor_mode,
        }
    }
}

/// Merges defaults -> `.robotsched/config.yaml` -> `ROBOTSCHED_*` env vars
/// (double underscore splits nested keys), then validates the result.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load() -> Result<SchedulerConfig, ConfigError> {
        let config: SchedulerConfig = Figment::new()
            .merge(Serialized::defaults(SchedulerConfig::default()))
            .merge(Yaml::file(".robotsched/config.yaml"))
            .merge(Env::prefixed("ROBOTSCHED_").split("__"))
            .extract()?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &SchedulerConfig) -> Result<(), ConfigError> {
        if config.worker_size == 0 {
            return Err(ConfigError::InvalidWorkerSize);
        }
        if config.queue_size == 0 {
            return Err(ConfigError::InvalidQueueSize);
        }
        if config.tick_period_ms == 0 {
            return Err(ConfigError::InvalidTickPeriod);
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        Ok(())
    }
}

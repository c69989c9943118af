//! `tracing` subscriber setup. No file rotation or secret scrubbing layers
//! here: those need `tracing-appender`, which this crate doesn't otherwise
//! use, so structured stdout logging is as far as the ambient stack goes.

use anyhow::{bail, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::LogFormat;

/// Initializes the global `tracing` subscriber. Call once, at process start.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let default_level = parse_log_level(level)?;
    let env_filter = EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_current_span(true)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(env_filter)
                .with_target(true)
                .init();
        }
    }

    tracing::info!(level, format = ?format, "logger initialized");
    Ok(())
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => bail!("invalid log level: {other}"),
    }
}

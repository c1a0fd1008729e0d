use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CommandLine;

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub payload: PathBuf,
    pub output: PathBuf,
    pub timeout: Duration,
    pub concurrent: usize,
    pub testing_times: usize,
    pub log_level: String,
}

impl RunConfig {
    pub fn from_cli(cli: &CommandLine) -> Result<Self> {
        let config = Self {
            payload: cli.payload.clone(),
            output: cli.output.clone(),
            timeout: Duration::from_millis(cli.timeout),
            concurrent: cli.concurrent,
            testing_times: cli.testing_times,
            log_level: cli.log_level.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(anyhow!("--timeout must be greater than 0 ms"));
        }
        if self.concurrent == 0 {
            return Err(anyhow!("--concurrent must be at least 1"));
        }
        self.validate_log_level()
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(anyhow!(
                "Invalid log level: {}. Valid levels are: trace, debug, info, warn, error",
                self.log_level
            )),
        }
    }

    /// Validate the log level is one of the supported values
    pub fn validate_log_level(&self) -> Result<()> {
        self.get_tracing_level().map(|_| ())
    }
}

//! Typed configuration for supervisors and the demo binary.
//!
//! Defaults cover the common case. Overrides come from environment variables
//! (call `dotenvy::dotenv().ok()` first in local dev) or from a TOML file.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Default poll interval of the completion waiter.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Consecutive zero-worker polls needed before a job counts as done.
pub const DEFAULT_SETTLE_POLLS: u32 = 5;
/// Progress channel capacity. Small, so slow consumers push back on workers.
pub const DEFAULT_PROGRESS_CAPACITY: usize = 1;
/// Worker count used by the demo binary when none is given.
pub const DEFAULT_MAX_WORKERS: usize = 2;

/// Tunables for a [`Job`](crate::job::Job) supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// How often the completion waiter samples the live-worker count.
    #[serde(rename = "poll_interval_ms", deserialize_with = "duration_ms")]
    pub poll_interval: Duration,
    /// Zero readings in a row required to declare completion.
    pub settle_polls: u32,
    /// Capacity of the progress channel returned by `supervise`.
    pub progress_capacity: usize,
    /// Suggested concurrency for callers that don't choose their own.
    pub max_workers: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_polls: DEFAULT_SETTLE_POLLS,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl SupervisorConfig {
    /// Defaults overridden by `RACKET_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(ms) = parsed_var::<u64>("RACKET_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(polls) = parsed_var("RACKET_SETTLE_POLLS")? {
            config.settle_polls = polls;
        }
        if let Some(capacity) = parsed_var("RACKET_PROGRESS_CAPACITY")? {
            config.progress_capacity = capacity;
        }
        if let Some(workers) = parsed_var("RACKET_MAX_WORKERS")? {
            config.max_workers = workers;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::Config(format!("bad supervisor config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file. A file that cannot be read is
    /// [`Error::Io`]; bad contents are [`Error::Config`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be nonzero".to_string()));
        }
        if self.settle_polls == 0 {
            return Err(Error::Config("settle_polls must be at least 1".to_string()));
        }
        if self.progress_capacity == 0 {
            return Err(Error::Config(
                "progress_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Process-level settings for the `racket` binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub supervisor: SupervisorConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            supervisor: SupervisorConfig::from_env()?,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid {name}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn duration_ms<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

//! Configuration for settle.
//!
//! Read from `~/.settle/config.toml`, or from the file named by
//! `SETTLE_CONFIG`. Every section and field is optional:
//!
//! ```toml
//! [retry]
//! retries = 3
//! timeout_ms = 5000
//! delay_ms = 1000
//!
//! [schedule]
//! limit = 2
//!
//! [log]
//! filter = "settle_core=debug"
//! ```
//!
//! The raw structs mirror the file. [`SettleConfig::retry_policy`] and
//! [`SettleConfig::schedule_limit`] resolve them into validated values.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

use settle_types::{PolicyError, RetryPolicy};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "SETTLE_CONFIG";

/// Scheduler limit used when `[schedule] limit` is absent.
pub const DEFAULT_LIMIT: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1);

#[derive(Debug, Default, Deserialize)]
pub struct SettleConfig {
    pub retry: Option<RetryConfig>,
    pub schedule: Option<ScheduleConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub retries: Option<u32>,
    /// Per-attempt timeout in milliseconds. Must be non-zero.
    pub timeout_ms: Option<u64>,
    /// Wait between attempts in milliseconds.
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleConfig {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` still wins.
    pub filter: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid [retry] section: {0}")]
    InvalidRetry(#[from] PolicyError),
    #[error("[schedule] limit must be at least 1")]
    InvalidLimit,
}

impl ConfigError {
    /// The file involved, for read and parse failures.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::InvalidRetry(_) | ConfigError::InvalidLimit => None,
        }
    }
}

impl SettleConfig {
    /// Load from the default location. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file");
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// The `[retry]` section over [`RetryPolicy::default`].
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let defaults = RetryPolicy::default();
        let Some(retry) = &self.retry else {
            return Ok(defaults);
        };
        let policy = RetryPolicy::new(
            retry.retries.unwrap_or(defaults.retries()),
            retry
                .timeout_ms
                .map_or(defaults.timeout(), Duration::from_millis),
            retry.delay_ms.map_or(defaults.delay(), Duration::from_millis),
        )?;
        Ok(policy)
    }

    /// `[schedule] limit`, or [`DEFAULT_LIMIT`].
    pub fn schedule_limit(&self) -> Result<NonZeroUsize, ConfigError> {
        match self.schedule.as_ref().and_then(|schedule| schedule.limit) {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) => NonZeroUsize::new(limit).ok_or(ConfigError::InvalidLimit),
        }
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.log.as_ref()?.filter.as_deref()
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".settle").join("config.toml"))
}

//! Resolved retry-with-timeout policy.
//!
//! Raw TOML fields live in `settle-config`; they are resolved into a
//! [`RetryPolicy`] at the parse boundary. Existence of a value is the proof of
//! its validity.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("retry timeout must be greater than zero")]
    ZeroTimeout,
}

/// How many times to retry, how long each attempt may run, and how long to
/// wait between attempts.
///
/// Invariant: `timeout` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    timeout: Duration,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, timeout: Duration, delay: Duration) -> Result<Self, PolicyError> {
        if timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        Ok(Self {
            retries,
            timeout,
            delay,
        })
    }

    /// Retries after the first attempt; `0` means a single attempt.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Total number of attempts, initial one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, PolicyError> {
        Self::new(self.retries, timeout, self.delay)
    }
}

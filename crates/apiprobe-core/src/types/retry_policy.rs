//! Retry policy shared by the request-level and attempt-level retry loops

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for one retry loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Delay between attempts in milliseconds (initial delay for backoff strategies)
    #[serde(default = "default_delay")]
    pub delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            delay_ms: default_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}

impl RetryPolicy {
    /// Fixed-delay policy, rejected when `max_attempts` is zero
    pub fn fixed(max_attempts: u32, delay: Duration) -> Result<Self> {
        let policy = Self {
            max_attempts,
            strategy: RetryStrategy::FixedDelay,
            delay_ms: duration_ms(delay),
            max_delay_ms: duration_ms(delay).max(default_max_delay()),
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// A single attempt with no delay
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::None,
            delay_ms: 0,
            ..Self::default()
        }
    }

    /// Reject policies that can never run an attempt
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_retry_policy(
                "max-attempts must be at least 1",
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::invalid_retry_policy(format!(
                "backoff-multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Base delay between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

fn duration_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Delay strategy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// Retry immediately
    None,

    /// Same delay before every retry (default)
    #[default]
    FixedDelay,

    /// Delay multiplied by `backoff-multiplier` after each attempt
    ExponentialBackoff,

    /// Delay grows by `delay-ms` after each attempt
    LinearBackoff,
}

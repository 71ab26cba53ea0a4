//! Engine configuration
//!
//! One `EngineConfig` is handed to the engine constructor; every test created
//! from that engine starts from these values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::RetryPolicy;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// HTTP request settings and the request-level retry policy
    #[serde(default)]
    pub request: RequestConfig,

    /// Attempt-level retry policy
    #[serde(default)]
    pub attempt: AttemptConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Mark every test as parallel-eligible unless it says otherwise
    #[serde(default)]
    pub parallel: bool,
}

impl EngineConfig {
    /// Check every section; called before the engine accepts the config
    pub fn validate(&self) -> Result<()> {
        if self.request.timeout_ms == 0 {
            return Err(Error::invalid_config("request.timeout-ms must be greater than 0"));
        }
        self.request.retry.validate()?;
        self.attempt.retry.validate()?;
        Ok(())
    }
}

/// HTTP request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestConfig {
    /// Timeout for a single HTTP call in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Retry policy for transport errors and status mismatches
    #[serde(default)]
    pub retry: RetryPolicy,

    /// User-Agent sent when a request does not set one
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
            retry: RetryPolicy::default(),
            user_agent: None,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout() -> u64 {
    10_000
}

/// Attempt-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttemptConfig {
    /// Retry policy applied to whole attempts
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// Attach request and response bodies to request steps
    #[serde(default = "default_true")]
    pub attach_bodies: bool,

    /// Bodies longer than this are truncated in attachments
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            attach_bodies: true,
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attachment_bytes() -> usize {
    64 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.request.timeout(), Duration::from_secs(10));
        assert_eq!(config.request.retry.max_attempts, 1);
        assert_eq!(config.attempt.retry.max_attempts, 1);
        assert!(config.report.attach_bodies);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
request:
  timeout-ms: 2500
attempt:
  retry:
    max-attempts: 3
    delay-ms: 100
"#;
        let config: EngineConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.request.timeout_ms, 2500);
        assert_eq!(config.request.retry, RetryPolicy::default());
        assert_eq!(config.attempt.retry.max_attempts, 3);
        assert_eq!(config.attempt.retry.delay_ms, 100);
        assert_eq!(config.report.max_attachment_bytes, 64 * 1024);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = EngineConfig::default();
        config.request.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = EngineConfig::default();
        config.attempt.retry.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidRetryPolicy { .. })
        ));
    }
}

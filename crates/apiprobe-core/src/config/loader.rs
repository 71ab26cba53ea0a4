//! Hierarchical configuration loader with precedence
//!
//! Loads the engine configuration from multiple sources with the following
//! precedence (low to high):
//! 1. Built-in defaults
//! 2. YAML config file (`apiprobe.yaml`, or an explicit path)
//! 3. Environment variables (APIPROBE_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::EngineConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "apiprobe.yaml";

/// Configuration hierarchy loader
pub struct ConfigLoader {
    /// Config file path
    path: Utf8PathBuf,
    /// Whether a missing file is an error
    required: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader for `apiprobe.yaml` in the working directory, if present
    pub fn new() -> Self {
        Self {
            path: Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
            required: false,
        }
    }

    /// Loader for an explicit config file, which must exist
    pub fn with_file(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// Get the config file path
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Load the engine configuration with hierarchical precedence
    pub fn load(&self) -> Result<EngineConfig> {
        let mut config = if self.path.exists() {
            debug!("Loading engine config from {}", self.path);
            self.load_yaml_file(&self.path)?
        } else if self.required {
            return Err(Error::config_not_found(self.path.as_str()));
        } else {
            EngineConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file(&self, path: &Utf8Path) -> Result<EngineConfig> {
        let content = fs::read_to_string(path)?;
        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(EngineConfig::default());
        }
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Apply environment variable overrides to the config
    fn apply_env_overrides(&self, config: &mut EngineConfig) -> Result<()> {
        if let Some(val) = parse_env("APIPROBE_REQUEST_TIMEOUT_MS")? {
            config.request.timeout_ms = val;
        }

        if let Some(val) = parse_env("APIPROBE_REQUEST_MAX_ATTEMPTS")? {
            config.request.retry.max_attempts = val;
        }

        if let Some(val) = parse_env("APIPROBE_REQUEST_DELAY_MS")? {
            config.request.retry.delay_ms = val;
        }

        if let Some(val) = parse_env("APIPROBE_ATTEMPT_MAX_ATTEMPTS")? {
            config.attempt.retry.max_attempts = val;
        }

        if let Some(val) = parse_env("APIPROBE_ATTEMPT_DELAY_MS")? {
            config.attempt.retry.delay_ms = val;
        }

        if let Ok(val) = env::var("APIPROBE_USER_AGENT") {
            config.request.user_agent = Some(val);
        }

        if let Some(val) = parse_env("APIPROBE_PARALLEL")? {
            config.parallel = val;
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{name} has an invalid value: {val}"))),
        Err(_) => Ok(None),
    }
}

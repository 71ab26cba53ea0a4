//! Error types for apiprobe-core
//!
//! These are configuration-time errors: they abort construction of an engine
//! or a test before any request is made. Failures observed while executing a
//! test are [`ClassifiedError`](crate::classify::ClassifiedError) values instead.

use thiserror::Error;

/// Result type alias using apiprobe-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for apiprobe
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Retry policy that can never run an attempt
    #[error("Invalid retry policy: {message}")]
    InvalidRetryPolicy { message: String },

    /// Test definition rejected by the validation pass
    #[error("Invalid test `{test}`: {message}")]
    InvalidTest { test: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Schema could not be compiled
    #[error("Schema compilation failed: {message}")]
    SchemaCompile { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid retry policy error
    pub fn invalid_retry_policy(message: impl Into<String>) -> Self {
        Self::InvalidRetryPolicy {
            message: message.into(),
        }
    }

    /// Create an invalid test error
    pub fn invalid_test(test: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTest {
            test: test.into(),
            message: message.into(),
        }
    }

    /// Create a schema compilation error
    pub fn schema_compile(message: impl Into<String>) -> Self {
        Self::SchemaCompile {
            message: message.into(),
        }
    }
}

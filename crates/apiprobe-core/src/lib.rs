//! # apiprobe-core
//!
//! Core library for apiprobe providing:
//! - Severity-tagged errors and the classifier that reduces them to one result state
//! - Retry policies, delay strategies and retry observers
//! - Engine configuration with hierarchical loading (defaults, YAML file, environment)
//! - JSON Schema validation of response payloads

pub mod classify;
pub mod config;
pub mod error;
pub mod retry;
pub mod schema;
pub mod types;

pub use classify::{
    broken, classify, optional, require, Classification, ClassifiedError, ErrorKind,
    ResultState, Severity,
};
pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use schema::{JsonSchema, SchemaViolation};
pub use types::{EngineConfig, RetryPolicy, RetryStrategy};

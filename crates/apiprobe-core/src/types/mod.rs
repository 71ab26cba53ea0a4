//! Type definitions for apiprobe configuration

mod engine_config;
mod retry_policy;

pub use engine_config::{AttemptConfig, EngineConfig, ReportConfig, RequestConfig};
pub use retry_policy::{RetryPolicy, RetryStrategy};

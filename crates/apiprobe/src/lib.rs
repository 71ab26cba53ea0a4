//! # apiprobe
//!
//! Declarative HTTP test execution engine.
//!
//! A test is described with a [`TestBuilder`]: the request, the expected
//! status code, predicates over the body, headers and whole response, an
//! optional JSON schema, and before/after hooks. Executing it runs two nested
//! retry loops:
//!
//! - the [`RequestExecutor`] retries single HTTP calls on transport errors and
//!   status mismatches
//! - the [`RetryOrchestrator`] reruns the whole attempt until its errors
//!   classify as success
//!
//! Every failure is a severity-tagged [`ClassifiedError`] and the outcome of
//! the last attempt is reduced to one [`ResultState`].

pub mod assert;
mod builder;
pub mod curl;
mod engine;
mod error;
mod executor;
pub mod hooks;
mod host;
mod orchestrator;
mod outcome;
mod plan;
pub mod report;
mod request;
mod response;
pub mod transport;

pub use apiprobe_core::{
    broken, optional, require, ClassifiedError, EngineConfig, ErrorKind, ResultState,
    RetryPolicy, Severity,
};

pub use builder::{Test, TestBuilder};
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, Result};
pub use executor::{Exchange, RequestExecutor};
pub use host::{HostRunner, HostSignal, NoOpHost, RecordingHost};
pub use orchestrator::{Attempt, RetryOrchestrator};
pub use outcome::{ResultAggregator, TestOutcome};
pub use plan::TestPlan;
pub use report::{
    MemoryReportSink, NoOpReportSink, ReportSink, StepReport, StepStatus, TracingReportSink,
};
pub use request::{MultipartField, PreparedRequest, RequestBody, RequestDefaults, RequestSpec};
pub use response::HttpResponse;
pub use transport::{HttpTransport, ReqwestTransport, TransportError};

pub use reqwest::Method;
pub use url::Url;

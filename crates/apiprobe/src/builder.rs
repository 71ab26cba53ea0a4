//! Fluent test definition
//!
//! ```rust,no_run
//! # async fn demo() -> apiprobe::Result<()> {
//! use apiprobe::assert::json;
//! use apiprobe::{Engine, EngineConfig, NoOpHost};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let outcome = engine
//!     .test("create user")
//!     .post("http://localhost:8080/users")
//!     .json(&serde_json::json!({ "name": "alice" }))
//!     .expect_status(201)
//!     .assert_body(json::equal("$.name", "alice"))
//!     .build()?
//!     .run(&NoOpHost)
//!     .await;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

use apiprobe_core::{ClassifiedError, RetryPolicy, Severity};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::assert::{Registration, SchemaExpectation, SchemaSource};
use crate::engine::Engine;
use crate::error::Result;
use crate::host::HostRunner;
use crate::outcome::{ResultAggregator, TestOutcome};
use crate::plan::TestPlan;
use crate::request::{MultipartField, PreparedRequest};
use crate::response::HttpResponse;

/// Accumulates one test definition
///
/// Single-writer: options are collected by value and handed off to one
/// execution.
pub struct TestBuilder {
    engine: Engine,
    plan: TestPlan,
}

impl TestBuilder {
    pub(crate) fn new(engine: Engine, name: impl Into<String>) -> Self {
        let config = engine.config();
        let mut plan = TestPlan::new(name);
        plan.request_retry = config.request.retry.clone();
        plan.attempt_retry = config.attempt.retry.clone();
        plan.timeout = config.request.timeout();
        plan.parallel = config.parallel;
        Self { engine, plan }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.plan.name = name.into();
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.plan.request.set_method(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.plan.request.set_url(url);
        self
    }

    pub fn get(self, url: impl Into<String>) -> Self {
        self.method(Method::GET).url(url)
    }

    pub fn post(self, url: impl Into<String>) -> Self {
        self.method(Method::POST).url(url)
    }

    pub fn put(self, url: impl Into<String>) -> Self {
        self.method(Method::PUT).url(url)
    }

    pub fn patch(self, url: impl Into<String>) -> Self {
        self.method(Method::PATCH).url(url)
    }

    pub fn delete(self, url: impl Into<String>) -> Self {
        self.method(Method::DELETE).url(url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.plan.request.add_header(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.plan.request.add_query(key, value);
        self
    }

    /// Raw body; a JSON body or multipart fields take precedence
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.plan.request.set_body(body);
        self
    }

    /// JSON body; multipart fields take precedence
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.plan.request.set_json(value);
        self
    }

    pub fn multipart_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.plan.request.add_multipart(MultipartField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn multipart_file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.plan.request.add_multipart(MultipartField::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            data: data.into(),
        });
        self
    }

    /// Send this request instead of one built from the options above
    pub fn request(mut self, request: PreparedRequest) -> Self {
        self.plan.request.set_prepared(request);
        self
    }

    /// Expected status code; 0 disables the check
    pub fn expect_status(mut self, status: u16) -> Self {
        self.plan.expected_status = Some(status);
        self
    }

    #[track_caller]
    pub fn assert_body(
        self,
        check: impl Fn(&[u8]) -> std::result::Result<(), ClassifiedError> + Send + Sync + 'static,
    ) -> Self {
        self.assert_body_with(check, Severity::Plain)
    }

    #[track_caller]
    pub fn assert_body_with(
        mut self,
        check: impl Fn(&[u8]) -> std::result::Result<(), ClassifiedError> + Send + Sync + 'static,
        severity: Severity,
    ) -> Self {
        self.plan
            .body_checks
            .push(Registration::new(Arc::new(check), severity));
        self
    }

    #[track_caller]
    pub fn assert_headers(
        self,
        check: impl Fn(&HeaderMap) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.assert_headers_with(check, Severity::Plain)
    }

    #[track_caller]
    pub fn assert_headers_with(
        mut self,
        check: impl Fn(&HeaderMap) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
        severity: Severity,
    ) -> Self {
        self.plan
            .header_checks
            .push(Registration::new(Arc::new(check), severity));
        self
    }

    #[track_caller]
    pub fn assert_response(
        self,
        check: impl Fn(&HttpResponse) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.assert_response_with(check, Severity::Plain)
    }

    #[track_caller]
    pub fn assert_response_with(
        mut self,
        check: impl Fn(&HttpResponse) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
        severity: Severity,
    ) -> Self {
        self.plan
            .response_checks
            .push(Registration::new(Arc::new(check), severity));
        self
    }

    #[track_caller]
    pub fn expect_schema(self, source: SchemaSource) -> Self {
        self.expect_schema_with(source, Severity::Plain)
    }

    #[track_caller]
    pub fn expect_schema_with(mut self, source: SchemaSource, severity: Severity) -> Self {
        self.plan.schema = Some(SchemaExpectation::new(source, severity));
        self
    }

    #[track_caller]
    pub fn before(
        self,
        hook: impl Fn(&mut PreparedRequest) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.before_with(hook, Severity::Plain)
    }

    #[track_caller]
    pub fn before_with(
        mut self,
        hook: impl Fn(&mut PreparedRequest) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
        severity: Severity,
    ) -> Self {
        self.plan.before.push(Registration::new(Arc::new(hook), severity));
        self
    }

    #[track_caller]
    pub fn after(
        self,
        hook: impl Fn(&HttpResponse, &[ClassifiedError]) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.after_with(hook, Severity::Plain)
    }

    #[track_caller]
    pub fn after_with(
        mut self,
        hook: impl Fn(&HttpResponse, &[ClassifiedError]) -> std::result::Result<(), ClassifiedError>
            + Send
            + Sync
            + 'static,
        severity: Severity,
    ) -> Self {
        self.plan.after.push(Registration::new(Arc::new(hook), severity));
        self
    }

    /// Retry policy for single HTTP calls
    pub fn request_retry(mut self, policy: RetryPolicy) -> Self {
        self.plan.request_retry = policy;
        self
    }

    /// Retry policy for whole attempts
    pub fn attempt_retry(mut self, policy: RetryPolicy) -> Self {
        self.plan.attempt_retry = policy;
        self
    }

    /// Bound on each HTTP call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.plan.timeout = timeout;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.plan.parallel = parallel;
        self
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    /// Run the validation pass and freeze the definition
    pub fn build(mut self) -> Result<Test> {
        self.plan.validate()?;
        Ok(Test {
            engine: self.engine,
            plan: self.plan,
        })
    }

    /// Validate, run once and clear the per-execution options
    ///
    /// The options are cleared whether or not validation passed.
    pub async fn execute(&mut self, host: &dyn HostRunner) -> Result<TestOutcome> {
        let outcome = match self.plan.validate() {
            Ok(()) => Ok(self.engine.run(&self.plan, host).await),
            Err(e) => Err(e.into()),
        };
        ResultAggregator::reset(&mut self.plan);
        outcome
    }
}

/// A validated test, ready to run any number of times
#[derive(Debug, Clone)]
pub struct Test {
    engine: Engine,
    plan: TestPlan,
}

impl Test {
    pub fn name(&self) -> &str {
        &self.plan.name
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn is_parallel(&self) -> bool {
        self.plan.parallel
    }

    pub async fn run(&self, host: &dyn HostRunner) -> TestOutcome {
        self.engine.run(&self.plan, host).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoOpHost;
    use crate::report::NoOpReportSink;
    use crate::transport::{HttpTransport, TransportError};
    use apiprobe_core::EngineConfig;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn send(
            &self,
            _request: PreparedRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            Err(TransportError::other("unreachable"))
        }
    }

    fn engine(config: EngineConfig) -> Engine {
        Engine::builder(config)
            .transport(Unreachable)
            .report_sink(NoOpReportSink)
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_come_from_engine_config() {
        let mut config = EngineConfig::default();
        config.request.timeout_ms = 2500;
        config.attempt.retry.max_attempts = 4;
        config.parallel = true;

        let builder = engine(config).test("users");
        assert_eq!(builder.plan().timeout, Duration::from_millis(2500));
        assert_eq!(builder.plan().attempt_retry.max_attempts, 4);
        assert!(builder.plan().parallel);
    }

    #[test]
    fn test_registration_trace_points_at_caller() {
        let line = line!() + 3;
        let builder = engine(EngineConfig::default())
            .test("users")
            .assert_body(|_| Ok(()));
        let trace = builder.plan().body_checks[0].trace();
        assert_eq!(trace.line(), line);
        assert!(trace.file().ends_with("builder.rs"));
    }

    #[test]
    fn test_build_rejects_missing_url() {
        assert!(engine(EngineConfig::default()).test("no url").build().is_err());
    }

    #[tokio::test]
    async fn test_execute_resets_after_failed_validation() {
        let mut builder = engine(EngineConfig::default())
            .test("no url")
            .expect_status(200)
            .assert_body(|_| Ok(()))
            .before(|_| Ok(()));

        assert!(builder.execute(&NoOpHost).await.is_err());
        assert!(builder.plan().name.is_empty());
        assert!(builder.plan().expected_status.is_none());
        assert_eq!(builder.plan().check_count(), 0);
        assert!(builder.plan().before.is_empty());
    }

    #[test]
    fn test_build_rejects_zero_attempts() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::once()
        };
        let result = engine(EngineConfig::default())
            .test("zero")
            .get("http://localhost/")
            .request_retry(policy)
            .build();
        assert!(result.is_err());
    }
}

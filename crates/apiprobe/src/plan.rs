//! Accumulated definition of one test

use apiprobe_core::{Error, Result, RetryPolicy};
use std::time::Duration;

use crate::assert::{BodyCheck, HeaderCheck, Registration, ResponseCheck, SchemaExpectation};
use crate::hooks::{AfterHook, BeforeHook};
use crate::request::RequestSpec;

/// Everything the builder collected for one test
///
/// Plain data: the orchestrator reads it, the aggregator clears the
/// per-execution parts after a run.
#[derive(Debug, Clone)]
pub struct TestPlan {
    pub name: String,
    pub request: RequestSpec,
    pub expected_status: Option<u16>,
    pub body_checks: Vec<Registration<BodyCheck>>,
    pub header_checks: Vec<Registration<HeaderCheck>>,
    pub response_checks: Vec<Registration<ResponseCheck>>,
    pub schema: Option<SchemaExpectation>,
    pub before: Vec<Registration<BeforeHook>>,
    pub after: Vec<Registration<AfterHook>>,
    pub request_retry: RetryPolicy,
    pub attempt_retry: RetryPolicy,
    pub timeout: Duration,
    pub parallel: bool,
}

impl TestPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: RequestSpec::new(),
            expected_status: None,
            body_checks: Vec::new(),
            header_checks: Vec::new(),
            response_checks: Vec::new(),
            schema: None,
            before: Vec::new(),
            after: Vec::new(),
            request_retry: RetryPolicy::once(),
            attempt_retry: RetryPolicy::once(),
            timeout: Duration::from_secs(10),
            parallel: false,
        }
    }

    /// Validation pass run before the first attempt
    ///
    /// Local schemas are compiled here so a broken schema is reported as a
    /// configuration error instead of a failed test.
    pub fn validate(&mut self) -> Result<()> {
        let name = self.name.clone();
        let invalid = |message: String| Error::invalid_test(&name, message);

        self.request.validate().map_err(&invalid)?;
        self.request_retry
            .validate()
            .map_err(|e| invalid(format!("request retry: {e}")))?;
        self.attempt_retry
            .validate()
            .map_err(|e| invalid(format!("attempt retry: {e}")))?;
        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than 0".to_string()));
        }
        if let Some(schema) = self.schema.as_mut() {
            schema
                .prepare()
                .map_err(|e| invalid(format!("schema: {e}")))?;
        }
        Ok(())
    }

    /// Number of registered predicates across every pipeline
    pub fn check_count(&self) -> usize {
        self.body_checks.len()
            + self.header_checks.len()
            + self.response_checks.len()
            + usize::from(self.schema.is_some())
    }
}

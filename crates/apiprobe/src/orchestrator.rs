//! Attempt-level retry loop
//!
//! One attempt builds a fresh request, runs the before hooks, sends the
//! request through the [`RequestExecutor`], runs every assertion pipeline and
//! finally the after hooks. The attempt's errors are classified; the loop
//! stops on the first `Success` and otherwise retries the whole attempt.

use apiprobe_core::retry::{calculate_delay, should_sleep, RetryObserver, TracingObserver};
use apiprobe_core::types::ReportConfig;
use apiprobe_core::{classify::classify_detailed, ClassifiedError, ResultState};
use std::time::Duration;
use tokio::time::Instant;

use crate::assert::{failure_step, AssertionPipeline};
use crate::executor::RequestExecutor;
use crate::hooks::{run_after, run_before};
use crate::host::HostRunner;
use crate::outcome::{ResultAggregator, TestOutcome};
use crate::plan::TestPlan;
use crate::report::{ReportSink, StepReport, StepStatus};
use crate::request::RequestDefaults;
use crate::response::HttpResponse;
use crate::transport::HttpTransport;

/// One run of the whole request and validation sequence
#[derive(Debug, Clone)]
pub struct Attempt {
    /// 1-based ordinal
    pub index: u32,
    /// Bound on each HTTP call made by this attempt
    pub timeout: Duration,
    pub response: Option<HttpResponse>,
    pub errors: Vec<ClassifiedError>,
}

impl Attempt {
    fn new(index: u32, timeout: Duration) -> Self {
        Self {
            index,
            timeout,
            response: None,
            errors: Vec::new(),
        }
    }
}

/// Drives the attempts of one test
pub struct RetryOrchestrator<'a> {
    transport: &'a dyn HttpTransport,
    sink: &'a dyn ReportSink,
    defaults: &'a RequestDefaults,
    report: &'a ReportConfig,
}

impl<'a> RetryOrchestrator<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        sink: &'a dyn ReportSink,
        defaults: &'a RequestDefaults,
        report: &'a ReportConfig,
    ) -> Self {
        Self {
            transport,
            sink,
            defaults,
            report,
        }
    }

    /// Run `plan` until an attempt succeeds or the attempt policy is exhausted
    pub async fn run(&self, plan: &TestPlan, host: &dyn HostRunner) -> TestOutcome {
        if plan.parallel {
            host.parallel();
        }

        let observer = TracingObserver::new(plan.name.as_str());
        let policy = &plan.attempt_retry;
        let max_attempts = policy.max_attempts.max(1);
        let started = Instant::now();

        let mut last = Attempt::new(0, plan.timeout);
        let mut state = ResultState::Success;
        let mut not_optional = 0;

        for index in 1..=max_attempts {
            observer.on_attempt_start(index, max_attempts);
            last = self.attempt(plan, index).await;

            let classification = classify_detailed(&last.errors);
            state = classification.state;
            not_optional = classification.not_optional;

            if state == ResultState::Success {
                observer.on_success(index, started.elapsed());
                break;
            }

            let delay = calculate_delay(policy, index);
            if index < max_attempts {
                observer.on_attempt_failed(index, &last.errors, delay);
                if should_sleep(policy, index, delay) {
                    tokio::time::sleep(delay).await;
                }
            } else {
                observer.on_exhausted(index, &last.errors);
            }
        }

        tracing::info!(
            test = %plan.name,
            state = %state,
            attempts = last.index,
            not_optional = not_optional,
            "test finished"
        );

        signal_host(host, &plan.name, state, &last.errors);
        ResultAggregator::aggregate(&plan.name, last, state)
    }

    async fn attempt(&self, plan: &TestPlan, index: u32) -> Attempt {
        let mut attempt = Attempt::new(index, plan.timeout);

        let mut request = match plan.request.build(self.defaults) {
            Ok(request) => request,
            Err(err) => {
                self.sink.step(failure_step("build", &err));
                attempt.errors.push(err);
                return attempt;
            }
        };

        if !plan.before.is_empty() {
            let failure = run_before(&plan.before, &mut request);
            self.phase_step("before hooks", failure.as_slice());
            if let Some(err) = failure {
                attempt.errors.push(err);
                return attempt;
            }
        }

        let observer = TracingObserver::new(format!("{} {}", request.method, request.url));
        let executor = RequestExecutor::new(
            self.transport,
            self.sink,
            &observer,
            plan.timeout,
            self.report,
        );
        let exchange = executor
            .send(&request, plan.expected_status, &plan.request_retry)
            .await;
        attempt.response = exchange.response;
        if !exchange.errors.is_empty() {
            attempt.errors = exchange.errors;
            return attempt;
        }
        let Some(response) = attempt.response.as_ref() else {
            attempt
                .errors
                .push(ClassifiedError::transport("request produced no response"));
            return attempt;
        };

        let mut errors = Vec::new();
        errors.extend(
            AssertionPipeline::new(self.sink, "body").run(&response.body[..], &plan.body_checks),
        );
        errors.extend(
            AssertionPipeline::new(self.sink, "headers")
                .run(&response.headers, &plan.header_checks),
        );
        errors.extend(
            AssertionPipeline::new(self.sink, "response").run(response, &plan.response_checks),
        );

        if let Some(expectation) = &plan.schema {
            let pipeline = AssertionPipeline::new(self.sink, "schema");
            match expectation.resolve(self.transport, plan.timeout).await {
                Ok(schema) => {
                    errors.extend(pipeline.run_schema(&response.body, &schema, expectation))
                }
                Err(err) => {
                    let err = expectation.decorate(err);
                    pipeline.report(&err);
                    errors.push(err);
                }
            }
        }
        if plan.check_count() > 0 {
            self.phase_step("validation", &errors);
        }

        if !plan.after.is_empty() {
            let hook_errors = run_after(&plan.after, response, &errors);
            for err in &hook_errors {
                self.sink.step(failure_step("after hook", err));
            }
            self.phase_step("after hooks", &hook_errors);
            errors.extend(hook_errors);
        }

        attempt.errors = errors;
        attempt
    }

    fn phase_step(&self, name: &str, errors: &[ClassifiedError]) {
        let status = StepStatus::from(classify_detailed(errors).state);
        self.sink
            .step(StepReport::new(name, status).parameter("errors", errors.len()));
    }
}

fn signal_host(
    host: &dyn HostRunner,
    name: &str,
    state: ResultState,
    errors: &[ClassifiedError],
) {
    let message = || {
        let first = errors.first().map(ClassifiedError::message).unwrap_or("");
        format!("{name}: {} error(s), first: {first}", errors.len())
    };

    match state {
        ResultState::Success | ResultState::Skipped => {}
        ResultState::Broken => host.broken(&message()),
        ResultState::Fail => host.fail(&message()),
        ResultState::FailFast => {
            let message = message();
            host.fail(&message);
            host.fail_now(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::Registration;
    use crate::hooks::BeforeHook;
    use crate::host::{HostSignal, RecordingHost};
    use crate::report::MemoryReportSink;
    use crate::request::PreparedRequest;
    use crate::transport::TransportError;
    use apiprobe_core::{RetryPolicy, Severity};
    use async_trait::async_trait;
    use reqwest::header::HeaderValue;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Answers with `statuses` in order, repeating the last one
    struct Scripted {
        statuses: Vec<u16>,
        calls: AtomicUsize,
        seen: Mutex<Vec<PreparedRequest>>,
    }

    impl Scripted {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: statuses.to_vec(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let status = self
                .statuses
                .get(call)
                .or(self.statuses.last())
                .copied()
                .unwrap_or(200);
            let url = request.url.clone();
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(StatusCode::from_u16(status).unwrap(), url))
        }
    }

    fn before(
        hook: impl Fn(&mut PreparedRequest) -> Result<(), ClassifiedError> + Send + Sync + 'static,
    ) -> Registration<BeforeHook> {
        Registration::new(Arc::new(hook), Severity::Plain)
    }

    fn plan(attempt_retry: RetryPolicy, request_retry: RetryPolicy) -> TestPlan {
        let mut plan = TestPlan::new("get users");
        plan.request.set_url("http://localhost/users");
        plan.expected_status = Some(200);
        plan.attempt_retry = attempt_retry;
        plan.request_retry = request_retry;
        plan
    }

    fn fixed(max_attempts: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(delay_ms)).unwrap()
    }

    async fn run(transport: &Scripted, plan: &TestPlan, host: &RecordingHost) -> TestOutcome {
        let sink = MemoryReportSink::new();
        let defaults = RequestDefaults::default();
        let report = ReportConfig::default();
        RetryOrchestrator::new(transport, &sink, &defaults, &report)
            .run(plan, host)
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_between_attempts_but_not_after_last() {
        let transport = Scripted::new(&[500]);
        let host = RecordingHost::new();

        let started = Instant::now();
        let outcome = run(&transport, &plan(fixed(3, 1000), RetryPolicy::once()), &host).await;

        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(transport.calls(), 3);
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.state(), ResultState::Fail);
        assert!(matches!(host.signals().as_slice(), [HostSignal::Fail(_)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let transport = Scripted::new(&[500]);
        let host = RecordingHost::new();

        let started = Instant::now();
        let outcome = run(&transport, &plan(fixed(3, 0), RetryPolicy::once()), &host).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(outcome.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_retry_timing() {
        let transport = Scripted::new(&[500]);
        let host = RecordingHost::new();

        let started = Instant::now();
        let outcome = run(&transport, &plan(fixed(2, 5000), fixed(3, 1000)), &host).await;

        // two request sleeps per attempt, one attempt sleep between them
        assert_eq!(started.elapsed(), Duration::from_secs(9));
        assert_eq!(transport.calls(), 6);
        assert_eq!(outcome.attempts(), 2);
        assert!(!outcome.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_successful_attempt() {
        let transport = Scripted::new(&[503, 200]);
        let host = RecordingHost::new();

        let started = Instant::now();
        let outcome = run(&transport, &plan(fixed(5, 1000), RetryPolicy::once()), &host).await;

        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(outcome.attempts(), 2);
        assert!(outcome.is_success());
        assert!(outcome.errors().is_empty());
        assert!(host.signals().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_is_rebuilt_for_every_attempt() {
        let transport = Scripted::new(&[500]);
        let host = RecordingHost::new();
        let mut plan = plan(fixed(3, 10), RetryPolicy::once());
        plan.before.push(before(|request| {
            request
                .headers
                .append("x-attempt", HeaderValue::from_static("1"));
            Ok(())
        }));

        run(&transport, &plan, &host).await;

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        for request in seen.iter() {
            assert_eq!(request.headers.get_all("x-attempt").iter().count(), 1);
        }
    }
}

//! Request-level retry loop
//!
//! One call to [`RequestExecutor::send`] performs up to
//! `policy.max_attempts` HTTP calls for the same prepared request. A try
//! fails when the transport errors (including the per-try timeout) or when an
//! expected status code is configured and does not match.

use apiprobe_core::retry::{calculate_delay, should_sleep, RetryObserver};
use apiprobe_core::types::ReportConfig;
use apiprobe_core::{ClassifiedError, RetryPolicy};
use std::time::Duration;
use tokio::time::Instant;

use crate::curl::to_curl;
use crate::report::{clip, Attachment, ReportSink, StepReport, StepStatus};
use crate::request::{PreparedRequest, RequestBody};
use crate::response::HttpResponse;
use crate::transport::{HttpTransport, TransportError};

/// Result of one request-level retry loop
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    /// Response of the last try that got one
    pub response: Option<HttpResponse>,
    /// One error per failed try; empty when the last try succeeded
    pub errors: Vec<ClassifiedError>,
    /// Number of HTTP calls made
    pub tries: u32,
}

impl Exchange {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Sends a prepared request with request-level retries
pub struct RequestExecutor<'a> {
    transport: &'a dyn HttpTransport,
    sink: &'a dyn ReportSink,
    observer: &'a dyn RetryObserver,
    timeout: Duration,
    report: &'a ReportConfig,
}

impl<'a> RequestExecutor<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        sink: &'a dyn ReportSink,
        observer: &'a dyn RetryObserver,
        timeout: Duration,
        report: &'a ReportConfig,
    ) -> Self {
        Self {
            transport,
            sink,
            observer,
            timeout,
            report,
        }
    }

    /// Send `request` until a try succeeds or the policy is exhausted
    ///
    /// Every try is reported as one step before the retry decision. A zero
    /// `expected_status` disables the status check.
    pub async fn send(
        &self,
        request: &PreparedRequest,
        expected_status: Option<u16>,
        policy: &RetryPolicy,
    ) -> Exchange {
        let started = Instant::now();
        let max_attempts = policy.max_attempts.max(1);
        let expected_status = expected_status.filter(|status| *status != 0);
        let mut exchange = Exchange::default();

        for attempt in 1..=max_attempts {
            self.observer.on_attempt_start(attempt, max_attempts);
            exchange.tries = attempt;

            let try_started = Instant::now();
            let call = self.transport.send(request.clone());
            let result = match tokio::time::timeout(self.timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.timeout)),
            };

            let (response, failure) = match result {
                Ok(response) => {
                    let actual = response.status.as_u16();
                    let failure = expected_status
                        .filter(|expected| *expected != actual)
                        .map(|expected| ClassifiedError::status_mismatch(expected, actual));
                    (Some(response), failure)
                }
                Err(e) => {
                    let err = ClassifiedError::transport(format!(
                        "{} {} failed: {e}",
                        request.method, request.url
                    ))
                    .with_name(format!("{} {}", request.method, request.url))
                    .with_source(e);
                    (None, Some(err))
                }
            };

            self.report_try(
                attempt,
                max_attempts,
                request,
                response.as_ref(),
                failure.as_ref(),
                try_started.elapsed(),
            );

            if response.is_some() {
                exchange.response = response;
            }

            let Some(err) = failure else {
                self.observer.on_success(attempt, started.elapsed());
                exchange.errors.clear();
                return exchange;
            };
            exchange.errors.push(err);

            let delay = calculate_delay(policy, attempt);
            if attempt < max_attempts {
                let latest = &exchange.errors[exchange.errors.len() - 1..];
                self.observer.on_attempt_failed(attempt, latest, delay);
                if should_sleep(policy, attempt, delay) {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        self.observer.on_exhausted(exchange.tries, &exchange.errors);
        exchange
    }

    fn report_try(
        &self,
        attempt: u32,
        max_attempts: u32,
        request: &PreparedRequest,
        response: Option<&HttpResponse>,
        failure: Option<&ClassifiedError>,
        elapsed: Duration,
    ) {
        let status = if failure.is_some() {
            StepStatus::Failed
        } else {
            StepStatus::Passed
        };
        let mut step = StepReport::new(
            format!(
                "request {attempt}/{max_attempts}: {} {}",
                request.method, request.url
            ),
            status,
        )
        .parameter("elapsed_ms", elapsed.as_millis())
        .attach(Attachment::text("curl", to_curl(request)));

        if let Some(err) = failure {
            step = step.parameter("error", err.message());
        }

        let limit = self.report.max_attachment_bytes;
        if self.report.attach_bodies {
            if let RequestBody::Bytes(body) = &request.body {
                step = step.attach(Attachment::new(
                    "request body",
                    "application/octet-stream",
                    clip(body, limit),
                ));
            }
        }

        if let Some(response) = response {
            step = step
                .parameter("status", response.status.as_u16())
                .attach(Attachment::text("response headers", format_headers(response)));
            if self.report.attach_bodies {
                let mime = response
                    .header("content-type")
                    .unwrap_or("application/octet-stream");
                step = step.attach(Attachment::new(
                    "response body",
                    mime,
                    clip(&response.body, limit),
                ));
            }
        }

        self.sink.step(step);
    }
}

fn format_headers(response: &HttpResponse) -> String {
    response
        .headers
        .iter()
        .map(|(name, value)| {
            format!("{}: {}\n", name, String::from_utf8_lossy(value.as_bytes()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe_core::retry::{NoOpObserver, StatsObserver};
    use apiprobe_core::ErrorKind;
    use async_trait::async_trait;
    use reqwest::{Method, StatusCode};
    use std::sync::atomic::{AtomicU32, Ordering};
    use url::Url;

    use crate::report::MemoryReportSink;

    /// Fails with a transport error until `failures` calls were made, then
    /// answers with `status`
    struct Flaky {
        failures: u32,
        status: u16,
        calls: AtomicU32,
    }

    #[async_trait]
    impl HttpTransport for Flaky {
        async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(TransportError::other("connection refused"));
            }
            Ok(HttpResponse::new(StatusCode::from_u16(self.status).unwrap(), request.url))
        }
    }

    struct Hang;

    #[async_trait]
    impl HttpTransport for Hang {
        async fn send(&self, _request: PreparedRequest) -> Result<HttpResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(TransportError::other("unreachable"))
        }
    }

    fn request() -> PreparedRequest {
        PreparedRequest::new(Method::GET, Url::parse("http://localhost/users").unwrap())
    }

    fn flaky(failures: u32, status: u16) -> Flaky {
        Flaky {
            failures,
            status,
            calls: AtomicU32::new(0),
        }
    }

    fn executor<'a>(
        transport: &'a dyn HttpTransport,
        sink: &'a MemoryReportSink,
        observer: &'a dyn RetryObserver,
        timeout: Duration,
        report: &'a ReportConfig,
    ) -> RequestExecutor<'a> {
        RequestExecutor::new(transport, sink, observer, timeout, report)
    }

    fn policy(max_attempts: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(delay_ms)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_transport_failure_uses_every_try() {
        let transport = flaky(u32::MAX, 200);
        let sink = MemoryReportSink::new();
        let observer = StatsObserver::new();
        let report = ReportConfig::default();
        let executor = executor(&transport, &sink, &observer, Duration::from_secs(10), &report);

        let started = Instant::now();
        let exchange = executor.send(&request(), None, &policy(3, 1000)).await;

        assert_eq!(exchange.tries, 3);
        assert_eq!(exchange.errors.len(), 3);
        assert!(exchange.errors.iter().all(|e| e.kind() == ErrorKind::Transport));
        assert!(exchange.response.is_none());
        // two sleeps, none after the last try
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
        assert_eq!(sink.steps().len(), 3);
        assert_eq!(observer.failures(), 2);
        assert_eq!(observer.exhaustions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transport_errors() {
        let transport = flaky(2, 200);
        let sink = MemoryReportSink::new();
        let observer = StatsObserver::new();
        let report = ReportConfig::default();
        let executor = executor(&transport, &sink, &observer, Duration::from_secs(10), &report);

        let exchange = executor.send(&request(), Some(200), &policy(5, 100)).await;

        assert!(exchange.is_success());
        assert_eq!(exchange.tries, 3);
        assert_eq!(exchange.response.unwrap().status, StatusCode::OK);
        let steps = sink.steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].status, StepStatus::Failed);
        assert_eq!(steps[2].status, StepStatus::Passed);
        assert_eq!(observer.successes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_mismatch_keeps_last_response() {
        let transport = flaky(0, 404);
        let sink = MemoryReportSink::new();
        let report = ReportConfig::default();
        let executor = executor(&transport, &sink, &NoOpObserver, Duration::from_secs(10), &report);

        let exchange = executor.send(&request(), Some(201), &policy(3, 10)).await;

        assert_eq!(exchange.errors.len(), 3);
        assert!(exchange.errors.iter().all(|e| e.kind() == ErrorKind::Protocol));
        assert_eq!(exchange.response.unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(sink.steps()[0].param("status"), Some("404"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_expected_status_disables_check() {
        let transport = flaky(0, 500);
        let sink = MemoryReportSink::new();
        let report = ReportConfig::default();
        let executor = executor(&transport, &sink, &NoOpObserver, Duration::from_secs(10), &report);

        let exchange = executor.send(&request(), Some(0), &policy(3, 10)).await;
        assert!(exchange.is_success());
        assert_eq!(exchange.tries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_transport_error() {
        let sink = MemoryReportSink::new();
        let report = ReportConfig::default();
        let executor = executor(&Hang, &sink, &NoOpObserver, Duration::from_millis(50), &report);

        let started = Instant::now();
        let exchange = executor.send(&request(), None, &policy(2, 100)).await;

        assert_eq!(exchange.errors.len(), 2);
        assert!(exchange.errors[0].message().contains("timed out"));
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }
}

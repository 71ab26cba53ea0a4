use apiprobe_core::{ClassifiedError, JsonSchema};

use super::{Registration, SchemaExpectation};
use crate::report::{Attachment, ReportSink, StepReport, StepStatus};

/// Runs an ordered group of predicates of one kind
///
/// Every predicate runs even when an earlier one fails. Each failure is
/// tagged with its registration's severity and reported as its own step
/// before it is added to the returned list.
pub struct AssertionPipeline<'a> {
    sink: &'a dyn ReportSink,
    group: &'static str,
}

impl<'a> AssertionPipeline<'a> {
    pub fn new(sink: &'a dyn ReportSink, group: &'static str) -> Self {
        Self { sink, group }
    }

    pub fn run<T, F>(&self, input: &T, checks: &[Registration<F>]) -> Vec<ClassifiedError>
    where
        T: ?Sized,
        F: ?Sized + Fn(&T) -> Result<(), ClassifiedError>,
    {
        let mut errors = Vec::new();
        for registration in checks {
            if let Err(err) = (registration.check())(input) {
                let err = registration.decorate(err);
                self.report(&err);
                errors.push(err);
            }
        }
        errors
    }

    /// Validate a body against a compiled schema
    ///
    /// Every violation becomes one error.
    pub fn run_schema(
        &self,
        body: &[u8],
        schema: &JsonSchema,
        expectation: &SchemaExpectation,
    ) -> Vec<ClassifiedError> {
        schema
            .validate_bytes(body)
            .into_iter()
            .map(|violation| {
                let err = expectation.decorate(violation.into_error());
                self.report(&err);
                err
            })
            .collect()
    }

    /// Report one already-decorated failure
    pub fn report(&self, err: &ClassifiedError) {
        self.sink.step(failure_step(self.group, err));
    }
}

pub(crate) fn failure_step(group: &str, err: &ClassifiedError) -> StepReport {
    let label = err.name().unwrap_or_else(|| err.message());
    let mut step = StepReport::new(
        format!("{group}: {label}"),
        StepStatus::from(err.report_state()),
    )
    .parameter("kind", err.kind())
    .parameter("error", err.message());

    if let Some(actual) = err.actual() {
        step = step.parameter("actual", actual);
    }
    if let Some(expected) = err.expected() {
        step = step.parameter("expected", expected);
    }
    if let Some(trace) = err.trace() {
        step = step.parameter("trace", format!("{}:{}", trace.file(), trace.line()));
    }

    step.attach(Attachment::text("error", err.details()))
}

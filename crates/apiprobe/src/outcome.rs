use apiprobe_core::classify::classify_detailed;
use apiprobe_core::{ClassifiedError, ResultState};

use crate::orchestrator::Attempt;
use crate::plan::TestPlan;
use crate::response::HttpResponse;

/// Final result of one execution
///
/// Carries only the data of the last attempt made.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    name: String,
    response: Option<HttpResponse>,
    errors: Vec<ClassifiedError>,
    state: ResultState,
    attempts: u32,
}

impl TestOutcome {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub fn errors(&self) -> &[ClassifiedError] {
        &self.errors
    }

    /// Internal state, `FailFast` included
    pub fn state(&self) -> ResultState {
        self.state
    }

    /// State as shown in a report
    pub fn external_state(&self) -> ResultState {
        self.state.external()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Errors that count against the test
    pub fn not_optional(&self) -> usize {
        classify_detailed(&self.errors).not_optional
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }
}

/// Packages the last attempt into an outcome
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn aggregate(name: &str, last: Attempt, state: ResultState) -> TestOutcome {
        TestOutcome {
            name: name.to_string(),
            response: last.response,
            errors: last.errors,
            state,
            attempts: last.index,
        }
    }

    /// Clear the per-execution parts of a plan
    ///
    /// Request options and retry settings survive so the builder can be run
    /// again with fresh expectations.
    pub fn reset(plan: &mut TestPlan) {
        plan.name.clear();
        plan.expected_status = None;
        plan.body_checks.clear();
        plan.header_checks.clear();
        plan.response_checks.clear();
        plan.schema = None;
        plan.before.clear();
        plan.after.clear();
    }
}

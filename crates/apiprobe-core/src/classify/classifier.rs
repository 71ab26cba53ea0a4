use super::error::{ClassifiedError, Severity};
use super::state::ResultState;

/// Classification of one error batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Resulting state
    pub state: ResultState,
    /// Number of errors that count against the test
    pub not_optional: usize,
}

/// Reduce an error batch to one result state
pub fn classify(errors: &[ClassifiedError]) -> ResultState {
    classify_detailed(errors).state
}

/// Reduce an error batch to one result state, keeping the not-optional tally
///
/// Errors are visited in order and each contributes through its effective
/// severity only:
///
/// | severity | running state | tallied |
/// |----------|---------------|---------|
/// | optional | success       | no      |
/// | broken   | broken        | no      |
/// | require  | fail-fast     | yes     |
/// | plain    | unchanged     | yes     |
///
/// A nonzero tally forces `Fail`, overriding any broken or fail-fast state,
/// except that `FailFast` survives when every tallied error was require-tagged.
/// With a zero tally the batch is `Broken` if a broken error was seen and
/// `Success` otherwise.
pub fn classify_detailed(errors: &[ClassifiedError]) -> Classification {
    let mut saw_broken = false;
    let mut not_optional = 0;
    let mut all_require = true;

    for err in errors {
        match err.effective_severity() {
            Severity::Optional => {}
            Severity::Broken => saw_broken = true,
            Severity::Require => not_optional += 1,
            Severity::Plain => {
                not_optional += 1;
                all_require = false;
            }
        }
    }

    let state = if not_optional > 0 {
        if all_require {
            ResultState::FailFast
        } else {
            ResultState::Fail
        }
    } else if saw_broken {
        ResultState::Broken
    } else {
        ResultState::Success
    };

    Classification {
        state,
        not_optional,
    }
}

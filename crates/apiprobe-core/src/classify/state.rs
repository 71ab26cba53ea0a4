use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of classifying one attempt (or one error, for report steps)
///
/// Variants are ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultState {
    /// No error that counts against the test
    Success,

    /// The error was optional; reported but not counted
    Skipped,

    /// Only broken-tagged errors were observed
    Broken,

    /// At least one error counts against the test
    Fail,

    /// Failed, and the host runner should stop immediately
    FailFast,
}

impl ResultState {
    /// The state as rendered in a final report
    ///
    /// `Skipped` renders as `Success` and `FailFast` renders as `Fail`; the
    /// distinction only matters inside the engine.
    pub fn external(self) -> Self {
        match self {
            ResultState::Success | ResultState::Skipped => ResultState::Success,
            ResultState::Broken => ResultState::Broken,
            ResultState::Fail | ResultState::FailFast => ResultState::Fail,
        }
    }

    /// Whether the state counts as a pass
    pub fn is_success(self) -> bool {
        matches!(self, ResultState::Success | ResultState::Skipped)
    }

    /// Whether the state counts as a failure (broken excluded)
    pub fn is_failure(self) -> bool {
        matches!(self, ResultState::Fail | ResultState::FailFast)
    }

    /// Whether the host runner should be asked to stop immediately
    pub fn requests_stop(self) -> bool {
        self == ResultState::FailFast
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultState::Success => "success",
            ResultState::Skipped => "skipped",
            ResultState::Broken => "broken",
            ResultState::Fail => "fail",
            ResultState::FailFast => "fail-fast",
        }
    }
}

impl fmt::Display for ResultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

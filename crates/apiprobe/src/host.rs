//! Signals from the engine to the host test runner

use std::sync::{Mutex, PoisonError};

/// The host test runner driving an execution
///
/// The engine never schedules tests itself. It only tells the host what it
/// found: that a test may run in parallel, and how the test ended.
pub trait HostRunner: Send + Sync {
    /// The test is eligible to run concurrently with others
    fn parallel(&self);

    /// Mark the test broken
    fn broken(&self, message: &str);

    /// Mark the test failed and keep going
    fn fail(&self, message: &str);

    /// Stop the run as soon as possible
    fn fail_now(&self, message: &str);
}

/// A signal received by [`RecordingHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    Parallel,
    Broken(String),
    Fail(String),
    FailNow(String),
}

/// Records every signal, for tests and simple runners
#[derive(Debug, Default)]
pub struct RecordingHost {
    signals: Mutex<Vec<HostSignal>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<HostSignal> {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_parallel(&self) -> bool {
        self.signals().contains(&HostSignal::Parallel)
    }

    pub fn stop_requested(&self) -> bool {
        self.signals()
            .iter()
            .any(|s| matches!(s, HostSignal::FailNow(_)))
    }

    fn push(&self, signal: HostSignal) {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
    }
}

impl HostRunner for RecordingHost {
    fn parallel(&self) {
        self.push(HostSignal::Parallel);
    }

    fn broken(&self, message: &str) {
        self.push(HostSignal::Broken(message.to_string()));
    }

    fn fail(&self, message: &str) {
        self.push(HostSignal::Fail(message.to_string()));
    }

    fn fail_now(&self, message: &str) {
        self.push(HostSignal::FailNow(message.to_string()));
    }
}

/// Ignores every signal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHost;

impl HostRunner for NoOpHost {
    fn parallel(&self) {}
    fn broken(&self, _message: &str) {}
    fn fail(&self, _message: &str) {}
    fn fail_now(&self, _message: &str) {}
}

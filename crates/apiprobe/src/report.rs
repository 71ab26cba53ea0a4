//! Report sink seam
//!
//! Every request try, every predicate failure and every hook phase is
//! recorded as one named [`StepReport`]. Rendering is left to the sink.

use apiprobe_core::ResultState;
use bytes::Bytes;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Status of one report step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    Passed,
    Failed,
    Broken,
    Skipped,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Broken => "broken",
            StepStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ResultState> for StepStatus {
    fn from(state: ResultState) -> Self {
        match state {
            ResultState::Success => StepStatus::Passed,
            ResultState::Skipped => StepStatus::Skipped,
            ResultState::Broken => StepStatus::Broken,
            ResultState::Fail | ResultState::FailFast => StepStatus::Failed,
        }
    }
}

/// A named byte attachment
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub content: Bytes,
}

impl Attachment {
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            content: content.into(),
        }
    }

    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(name, "text/plain", content.into())
    }
}

/// One report step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub parameters: Vec<(String, String)>,
    pub attachments: Vec<Attachment>,
}

impl StepReport {
    pub fn new(name: impl Into<String>, status: StepStatus) -> Self {
        Self {
            name: name.into(),
            status,
            parameters: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.push((key.into(), value.to_string()));
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }
}

/// Receives report steps
pub trait ReportSink: Send + Sync {
    fn step(&self, step: StepReport);
}

impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    fn step(&self, step: StepReport) {
        (**self).step(step)
    }
}

/// Logs each step through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn step(&self, step: StepReport) {
        match step.status {
            StepStatus::Passed | StepStatus::Skipped => tracing::debug!(
                step = %step.name,
                status = %step.status,
                attachments = step.attachments.len(),
                "step"
            ),
            StepStatus::Broken | StepStatus::Failed => tracing::info!(
                step = %step.name,
                status = %step.status,
                attachments = step.attachments.len(),
                "step"
            ),
        }
    }
}

/// Discards every step
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReportSink;

impl ReportSink for NoOpReportSink {
    fn step(&self, _step: StepReport) {}
}

/// Keeps every step in memory
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    steps: Mutex<Vec<StepReport>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<StepReport> {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Steps whose name starts with `prefix`
    pub fn steps_named(&self, prefix: &str) -> Vec<StepReport> {
        self.steps()
            .into_iter()
            .filter(|step| step.name.starts_with(prefix))
            .collect()
    }

    pub fn clear(&self) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ReportSink for MemoryReportSink {
    fn step(&self, step: StepReport) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(step);
    }
}

/// Truncate a body for attachment
pub(crate) fn clip(body: &[u8], limit: usize) -> Bytes {
    if body.len() <= limit {
        Bytes::copy_from_slice(body)
    } else {
        let mut clipped = body[..limit].to_vec();
        let note = format!("\n... truncated {} bytes", body.len() - limit);
        clipped.extend_from_slice(note.as_bytes());
        Bytes::from(clipped)
    }
}

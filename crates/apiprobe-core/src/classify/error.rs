use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use super::state::ResultState;

/// Field key holding the observed value
pub const FIELD_ACTUAL: &str = "Actual";

/// Field key holding the expected value
pub const FIELD_EXPECTED: &str = "Expected";

/// Where an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request could not be constructed
    Build,
    /// Network or timeout failure
    Transport,
    /// Unexpected status code
    Protocol,
    /// A predicate rejected the response
    Assertion,
    /// The body violates a JSON schema
    Schema,
    /// A before/after hook failed
    Hook,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Build => "build",
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Assertion => "assertion",
            ErrorKind::Schema => "schema",
            ErrorKind::Hook => "hook",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to a predicate or hook at registration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// Counts against the test
    #[default]
    Plain,
    /// Reported as skipped, never fails the test
    Optional,
    /// Marks the test broken unless a plain failure is also present
    Broken,
    /// Fails the test and asks the host runner to stop
    Require,
}

impl Severity {
    /// Tag an error with this severity
    ///
    /// Tags are additive: applying a severity never clears one that is
    /// already present.
    pub fn apply(self, err: ClassifiedError) -> ClassifiedError {
        match self {
            Severity::Plain => err,
            Severity::Optional => optional(err),
            Severity::Broken => broken(err),
            Severity::Require => require(err),
        }
    }
}

/// An execution failure decorated with severity tags and structured fields
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    name: Option<String>,
    fields: BTreeMap<String, Value>,
    optional: bool,
    broken: bool,
    require: bool,
    trace: Option<&'static Location<'static>>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            name: None,
            fields: BTreeMap::new(),
            optional: false,
            broken: false,
            require: false,
            trace: None,
            source: None,
        }
    }

    /// Create a predicate failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assertion, message)
    }

    /// Create a network or timeout failure
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a hook failure
    pub fn hook(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Hook, message)
    }

    /// Create a request construction failure
    pub fn build(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Build, message)
    }

    /// Create a status code mismatch carrying both codes as fields
    pub fn status_mismatch(expected: u16, actual: u16) -> Self {
        Self::new(
            ErrorKind::Protocol,
            format!("expected status code {expected}, got {actual}"),
        )
        .with_name("status code")
        .with_expected(expected)
        .with_actual(actual)
    }

    /// Create a schema violation at a JSON pointer
    pub fn schema_violation(path: &str, field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let text = if path.is_empty() {
            message
        } else {
            format!("{path}: {message}")
        };
        Self::new(ErrorKind::Schema, text)
            .with_name(field)
            .with_field("Path", path)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_actual(self, value: impl Into<Value>) -> Self {
        self.with_field(FIELD_ACTUAL, value)
    }

    pub fn with_expected(self, value: impl Into<Value>) -> Self {
        self.with_field(FIELD_EXPECTED, value)
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Attach a source location unless one is already recorded
    pub fn with_trace(mut self, trace: &'static Location<'static>) -> Self {
        self.trace.get_or_insert(trace);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn actual(&self) -> Option<&Value> {
        self.fields.get(FIELD_ACTUAL)
    }

    pub fn expected(&self) -> Option<&Value> {
        self.fields.get(FIELD_EXPECTED)
    }

    pub fn trace(&self) -> Option<&'static Location<'static>> {
        self.trace
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn is_require(&self) -> bool {
        self.require
    }

    /// The severity that decides classification
    ///
    /// Tags are tested in a fixed order (optional, broken, require) and the
    /// first one set wins.
    pub fn effective_severity(&self) -> Severity {
        if self.optional {
            Severity::Optional
        } else if self.broken {
            Severity::Broken
        } else if self.require {
            Severity::Require
        } else {
            Severity::Plain
        }
    }

    /// Status of the report step that records this error
    pub fn report_state(&self) -> ResultState {
        match self.effective_severity() {
            Severity::Optional => ResultState::Skipped,
            Severity::Broken => ResultState::Broken,
            Severity::Require => ResultState::FailFast,
            Severity::Plain => ResultState::Fail,
        }
    }

    /// Multi-line description with name, fields and trace, for report attachments
    pub fn details(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.name {
            out.push_str(&format!("Name: {name}\n"));
        }
        out.push_str(&format!("Kind: {}\nError: {}\n", self.kind, self.message));
        for (key, value) in &self.fields {
            out.push_str(&format!("{key}: {value}\n"));
        }
        if let Some(trace) = self.trace {
            out.push_str(&format!("Trace: {}:{}\n", trace.file(), trace.line()));
        }
        out
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Tag an error as optional
pub fn optional(mut err: ClassifiedError) -> ClassifiedError {
    err.optional = true;
    err
}

/// Tag an error as broken
pub fn broken(mut err: ClassifiedError) -> ClassifiedError {
    err.broken = true;
    err
}

/// Tag an error as require (fail and stop)
pub fn require(mut err: ClassifiedError) -> ClassifiedError {
    err.require = true;
    err
}

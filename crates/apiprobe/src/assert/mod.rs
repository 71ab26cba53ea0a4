//! Predicates and the pipeline that runs them
//!
//! A predicate is a pure function over one part of the response that returns
//! `Ok(())` or a [`ClassifiedError`]. It is registered together with a
//! [`Severity`] and the source location of the registering call.

pub mod body;
pub mod headers;
pub mod json;
mod pipeline;
pub mod response;
mod schema;

use apiprobe_core::{ClassifiedError, Severity};
use reqwest::header::HeaderMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::response::HttpResponse;

pub use pipeline::AssertionPipeline;
pub(crate) use pipeline::failure_step;
pub use schema::{SchemaExpectation, SchemaSource};

/// Predicate over the raw response body
pub type BodyCheck = dyn Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync;

/// Predicate over the response headers
pub type HeaderCheck = dyn Fn(&HeaderMap) -> Result<(), ClassifiedError> + Send + Sync;

/// Predicate over the whole response
pub type ResponseCheck = dyn Fn(&HttpResponse) -> Result<(), ClassifiedError> + Send + Sync;

/// A predicate with its severity and registration site
pub struct Registration<F: ?Sized> {
    check: Arc<F>,
    severity: Severity,
    trace: &'static Location<'static>,
}

impl<F: ?Sized> Registration<F> {
    /// Register `check`, recording the caller's source location
    #[track_caller]
    pub fn new(check: Arc<F>, severity: Severity) -> Self {
        Self {
            check,
            severity,
            trace: Location::caller(),
        }
    }

    pub fn check(&self) -> &F {
        &self.check
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn trace(&self) -> &'static Location<'static> {
        self.trace
    }

    /// Tag an error produced by this registration
    pub fn decorate(&self, err: ClassifiedError) -> ClassifiedError {
        self.severity.apply(err).with_trace(self.trace)
    }
}

impl<F: ?Sized> Clone for Registration<F> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
            severity: self.severity,
            trace: self.trace,
        }
    }
}

impl<F: ?Sized> fmt::Debug for Registration<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("severity", &self.severity)
            .field("trace", &format_args!("{}:{}", self.trace.file(), self.trace.line()))
            .finish()
    }
}

//! Pluggable HTTP transport
//!
//! The engine never performs network I/O itself: every call goes through an
//! [`HttpTransport`]. [`ReqwestTransport`] is the default implementation;
//! tests plug in scripted transports.

mod reqwest_transport;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::request::PreparedRequest;
use crate::response::HttpResponse;

pub use reqwest_transport::ReqwestTransport;

/// Errors raised by a transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// The call did not complete within the request timeout
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The HTTP client failed to send the request
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// Any other transport failure
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Sends one prepared request and buffers the response
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

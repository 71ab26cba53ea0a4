use thiserror::Error;

use crate::transport::TransportError;

/// Errors raised before any request is sent
///
/// Failures during execution are never returned here; they are classified
/// into the test outcome instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid engine configuration or test definition
    #[error(transparent)]
    Config(#[from] apiprobe_core::Error),

    /// The default transport could not be created
    #[error("failed to create HTTP transport: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;

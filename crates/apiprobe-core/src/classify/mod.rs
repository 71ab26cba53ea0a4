//! Severity-tagged errors and result classification
//!
//! Every failure observed while executing a test (transport error, status
//! mismatch, predicate failure, schema violation, hook failure) is carried as
//! a [`ClassifiedError`]. Severity tags on those errors decide how a batch of
//! them reduces to a single [`ResultState`].
//!
//! # Example
//!
//! ```rust
//! use apiprobe_core::classify::{broken, classify, ClassifiedError, ResultState};
//!
//! let errors = vec![broken(ClassifiedError::assertion("cache header missing"))];
//! assert_eq!(classify(&errors), ResultState::Broken);
//!
//! let errors = vec![
//!     broken(ClassifiedError::assertion("cache header missing")),
//!     ClassifiedError::assertion("wrong user id"),
//! ];
//! assert_eq!(classify(&errors), ResultState::Fail);
//! ```

mod classifier;
mod error;
mod state;

pub use classifier::{classify, classify_detailed, Classification};
pub use error::{
    broken, optional, require, ClassifiedError, ErrorKind, Severity, FIELD_ACTUAL,
    FIELD_EXPECTED,
};
pub use state::ResultState;

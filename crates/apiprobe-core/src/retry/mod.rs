//! Retry delay strategies and retry observation
//!
//! apiprobe runs two nested retry loops: the request executor retries a
//! single HTTP call, and the orchestrator retries a whole attempt. Both loops
//! share the pieces in this module:
//!
//! - [`calculate_delay`] turns a [`RetryPolicy`](crate::types::RetryPolicy)
//!   and an attempt number into the sleep before the next attempt
//! - [`RetryObserver`] receives attempt events; [`TracingObserver`] logs them
//!
//! # Example
//!
//! ```rust
//! use apiprobe_core::retry::calculate_delay;
//! use apiprobe_core::types::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::fixed(3, Duration::from_millis(200)).unwrap();
//! assert_eq!(calculate_delay(&policy, 1), Duration::from_millis(200));
//! assert_eq!(calculate_delay(&policy, 2), Duration::from_millis(200));
//! ```

mod observer;
mod strategies;

pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, should_sleep};

//! Common test infrastructure for apiprobe integration tests
//!
//! # Modules
//!
//! - `mock_server`: Wiremock setup helpers for API endpoints
//! - `harness`: An engine wired to an in-memory report sink and a recording host

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod harness;
pub mod mock_server;

pub use harness::*;
pub use mock_server::*;

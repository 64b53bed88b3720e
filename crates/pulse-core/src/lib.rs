//! # Pulse Core
//!
//! Core types and error handling shared by the Pulse crates:
//! - Error type and `Result` alias
//! - Probe outcome classification
//! - Poll loop states
//! - Metric names reported to a sink

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{LoopState, ProbeOutcome};

pub use http::StatusCode;

/// Metric names emitted by the poll loop
pub mod metric_names {
    /// Request completed with a 2xx status
    pub const SUCCESS: &str = "EndpointCall.Success";
    /// Request completed with a non-2xx status
    pub const FAILURE: &str = "EndpointCall.Failure";
    /// Numeric status of a completed request
    pub const STATUS_CODE: &str = "EndpointCall.StatusCode";
    /// Transport-level failure
    pub const EXCEPTION: &str = "EndpointCall.Exception";
    /// Any other failure inside an iteration
    pub const UNEXPECTED_ERROR: &str = "EndpointCall.UnexpectedError";

    /// All names, in reporting order
    pub const ALL: [&str; 5] = [SUCCESS, FAILURE, STATUS_CODE, EXCEPTION, UNEXPECTED_ERROR];
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::metric_names;
    pub use crate::types::{LoopState, ProbeOutcome};
}

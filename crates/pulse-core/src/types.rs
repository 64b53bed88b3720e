//! Probe outcome and poll loop state

use crate::error::Error;
use http::StatusCode;
use std::fmt;
use std::time::Duration;

/// Classified result of a single probe
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Request completed with a 2xx status
    Success {
        /// Response status
        status: StatusCode,
        /// Time until response headers arrived
        latency: Duration,
    },
    /// Request completed with a non-2xx status
    Failure {
        /// Response status
        status: StatusCode,
        /// Time until response headers arrived
        latency: Duration,
    },
    /// The HTTP exchange could not complete
    TransportError(Error),
    /// Anything else that went wrong during the iteration
    UnexpectedError(Error),
    /// Cancellation was observed while the request was in flight
    Cancelled,
}

impl ProbeOutcome {
    /// Classify a completed response by its status
    pub fn from_status(status: StatusCode, latency: Duration) -> Self {
        if status.is_success() {
            ProbeOutcome::Success { status, latency }
        } else {
            ProbeOutcome::Failure { status, latency }
        }
    }

    /// Classify an error raised while probing
    pub fn from_error(error: Error) -> Self {
        if error.is_transport() {
            ProbeOutcome::TransportError(error)
        } else {
            ProbeOutcome::UnexpectedError(error)
        }
    }

    /// Status code, if the request completed
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProbeOutcome::Success { status, .. } | ProbeOutcome::Failure { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Short outcome label used in log events
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeOutcome::Success { .. } => "success",
            ProbeOutcome::Failure { .. } => "failure",
            ProbeOutcome::TransportError(_) => "transport_error",
            ProbeOutcome::UnexpectedError(_) => "unexpected_error",
            ProbeOutcome::Cancelled => "cancelled",
        }
    }
}

/// Poll loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet running
    Idle,
    /// A probe is in flight
    Requesting,
    /// Waiting for the next interval
    Sleeping,
    /// Terminal
    Stopped,
}

impl LoopState {
    /// Whether the loop has terminated
    pub fn is_stopped(&self) -> bool {
        matches!(self, LoopState::Stopped)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Idle => write!(f, "idle"),
            LoopState::Requesting => write!(f, "requesting"),
            LoopState::Sleeping => write!(f, "sleeping"),
            LoopState::Stopped => write!(f, "stopped"),
        }
    }
}

//! # Pulse Runtime
//!
//! Runs the endpoint prober:
//! - HTTP probe with timeout and cancellation
//! - Poll loop with outcome classification and metrics reporting
//! - Graceful shutdown with signal handling

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod poll_loop;
pub mod probe;
pub mod shutdown;

pub use poll_loop::{LoopReport, PollLoop, PollSettings};
pub use probe::{HttpProbe, Probe};
pub use shutdown::{ShutdownSignal, SignalHandler};

pub use tokio_util::sync::CancellationToken;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::poll_loop::{LoopReport, PollLoop, PollSettings};
    pub use crate::probe::{HttpProbe, Probe};
    pub use crate::shutdown::{ShutdownSignal, SignalHandler};
    pub use pulse_core::{LoopState, ProbeOutcome};
}

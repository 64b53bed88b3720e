//! Error types for Pulse

use std::time::Duration;

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Pulse
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP exchange could not be completed (DNS, connect, reset)
    #[error("Request to '{url}' failed: {message}")]
    Transport {
        /// Target URL
        url: String,
        /// Underlying client error
        message: String,
    },

    /// The HTTP exchange did not finish within the configured timeout
    #[error("Request to '{url}' timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        /// Target URL
        url: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Metrics sink or exporter error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Error::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Whether the error means the HTTP exchange never completed
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }
}

//! HTTP probing of the configured endpoint

use crate::poll_loop::PollSettings;
use async_trait::async_trait;
use pulse_core::{Error, ProbeOutcome, Result, StatusCode};
use reqwest::redirect::Policy;
use std::error::Error as _;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// A single request against a target, racing a cancellation token
#[async_trait]
pub trait Probe: Send + Sync + fmt::Debug {
    /// Perform one probe
    ///
    /// Must return [`ProbeOutcome::Cancelled`] promptly once `cancel` fires.
    async fn probe(&self, cancel: &CancellationToken) -> ProbeOutcome;

    /// Target description used in log events
    fn target(&self) -> &str;
}

/// HTTP GET probe backed by a pooled client
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    timeout_duration: Duration,
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a new HTTP probe
    ///
    /// The client is built once and reused for every probe.
    pub fn new(settings: &PollSettings) -> Result<Self> {
        let redirect = if settings.follow_redirects {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::none()
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!("pulse/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(settings.timeout)
            .redirect(redirect)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: settings.url.clone(),
            timeout_duration: settings.timeout,
            client,
        })
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout_duration
    }

    /// GET the URL and read the whole body, all under one timeout
    async fn send(&self) -> Result<StatusCode> {
        let exchange = async {
            let response = self.client.get(&self.url).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            debug!(url = %self.url, status = status.as_u16(), bytes = body.len(), "Response read");
            Ok::<_, reqwest::Error>(status)
        };

        match timeout(self.timeout_duration, exchange).await {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => Err(self.classify_error(e)),
            Err(_) => Err(Error::timeout(&self.url, self.timeout_duration)),
        }
    }

    fn classify_error(&self, error: reqwest::Error) -> Error {
        if error.is_builder() {
            return Error::InvalidRequest(error_chain(&error));
        }
        if error.is_timeout() {
            return Error::timeout(&self.url, self.timeout_duration);
        }
        Error::transport(&self.url, error_chain(&error))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, cancel: &CancellationToken) -> ProbeOutcome {
        let start = Instant::now();

        debug!(url = %self.url, "Performing HTTP probe");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url = %self.url, "HTTP probe abandoned on cancellation");
                ProbeOutcome::Cancelled
            }
            result = self.send() => match result {
                Ok(status) => ProbeOutcome::from_status(status, start.elapsed()),
                Err(e) => ProbeOutcome::from_error(e),
            },
        }
    }

    fn target(&self) -> &str {
        &self.url
    }
}

/// Render an error with its source chain, `outer: inner: root`
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

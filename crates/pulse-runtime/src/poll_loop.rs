//! The cancellable poll loop
//!
//! ```text
//! Idle ──► Requesting ──► Sleeping ──► Requesting ──► ...
//!              │              │
//!              └──► Stopped ◄─┘   (cancellation)
//! ```
//!
//! Each iteration probes once, reports the outcome to the sink and sleeps for
//! the interval. Both the probe and the sleep race the cancellation token;
//! cancellation during the probe skips the sleep and reports nothing.

use crate::probe::{HttpProbe, Probe};
use chrono::Utc;
use futures::FutureExt;
use pulse_config::{ApplicationConfig, Config};
use pulse_core::{metric_names, Error, LoopState, ProbeOutcome, Result};
use pulse_metrics::MetricsSink;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Settings the loop runs with, fixed for its lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// URL requested on every iteration
    pub url: String,
    /// Delay after each probe
    pub interval: Duration,
    /// Upper bound for one request
    pub timeout: Duration,
    /// Follow redirects before classifying
    pub follow_redirects: bool,
}

impl PollSettings {
    /// Create settings that follow redirects
    pub fn new(url: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            interval,
            timeout,
            follow_redirects: true,
        }
    }
}

impl From<&ApplicationConfig> for PollSettings {
    fn from(app: &ApplicationConfig) -> Self {
        Self {
            url: app.endpoint_url.clone(),
            interval: app.interval(),
            timeout: app.timeout(),
            follow_redirects: app.follow_redirects,
        }
    }
}

impl From<&Config> for PollSettings {
    fn from(config: &Config) -> Self {
        Self::from(&config.application)
    }
}

/// Tally of what the loop did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Probes that produced an outcome
    pub iterations: u64,
    /// 2xx responses
    pub successes: u64,
    /// Non-2xx responses
    pub failures: u64,
    /// Exchanges that could not complete
    pub transport_errors: u64,
    /// Other failures inside an iteration
    pub unexpected_errors: u64,
}

/// Periodic prober
#[derive(Debug)]
pub struct PollLoop {
    settings: PollSettings,
    probe: Box<dyn Probe>,
    sink: Arc<dyn MetricsSink>,
    state: watch::Sender<LoopState>,
    report: LoopReport,
}

impl PollLoop {
    /// Create a loop probing `settings.url` over HTTP
    pub fn new(settings: PollSettings, sink: Arc<dyn MetricsSink>) -> Result<Self> {
        let probe = HttpProbe::new(&settings)?;
        Ok(Self::with_probe(settings, Box::new(probe), sink))
    }

    /// Create a loop from resolved configuration
    pub fn from_config(config: &Config, sink: Arc<dyn MetricsSink>) -> Result<Self> {
        Self::new(PollSettings::from(config), sink)
    }

    /// Create a loop with a custom probe
    pub fn with_probe(
        settings: PollSettings,
        probe: Box<dyn Probe>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            settings,
            probe,
            sink,
            state,
            report: LoopReport::default(),
        }
    }

    /// Settings in use
    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires
    pub async fn run(mut self, cancel: CancellationToken) -> LoopReport {
        info!(
            target_url = %self.probe.target(),
            interval_secs = self.settings.interval.as_secs_f64(),
            timeout_secs = self.settings.timeout.as_secs_f64(),
            "Poll loop started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.set_state(LoopState::Requesting);
            let outcome = self.probe_once(&cancel).await;

            if matches!(outcome, ProbeOutcome::Cancelled) {
                debug!("Cancelled during request");
                break;
            }

            self.record(outcome);

            self.set_state(LoopState::Sleeping);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cancelled during sleep");
                    break;
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        self.set_state(LoopState::Stopped);

        info!(
            iterations = self.report.iterations,
            successes = self.report.successes,
            failures = self.report.failures,
            transport_errors = self.report.transport_errors,
            unexpected_errors = self.report.unexpected_errors,
            "Poll loop stopped"
        );

        self.report
    }

    fn set_state(&self, state: LoopState) {
        debug!(state = %state, "Poll loop state");
        self.state.send_replace(state);
    }

    async fn probe_once(&self, cancel: &CancellationToken) -> ProbeOutcome {
        info!(
            timestamp = %Utc::now().to_rfc3339(),
            url = %self.probe.target(),
            "Calling endpoint"
        );

        match AssertUnwindSafe(self.probe.probe(cancel)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => ProbeOutcome::UnexpectedError(Error::Internal(format!(
                "probe panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    fn record(&mut self, outcome: ProbeOutcome) {
        self.report.iterations += 1;

        match &outcome {
            ProbeOutcome::Success { status, latency } => {
                self.report.successes += 1;
                info!(
                    status = status.as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "Endpoint call succeeded"
                );
            }
            ProbeOutcome::Failure { status, latency } => {
                self.report.failures += 1;
                warn!(
                    status = status.as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "Endpoint call returned a non-success status"
                );
            }
            ProbeOutcome::TransportError(e) => {
                self.report.transport_errors += 1;
                warn!(error = %e, "Request failed");
            }
            ProbeOutcome::UnexpectedError(e) => {
                self.report.unexpected_errors += 1;
                error!(error = %e, "Unexpected error");
            }
            ProbeOutcome::Cancelled => return,
        }

        let sink = &self.sink;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| emit(&**sink, &outcome))) {
            self.report.unexpected_errors += 1;
            error!(
                error = %panic_message(payload.as_ref()),
                "Metrics sink panicked, outcome not recorded"
            );
        }
    }
}

/// Translate an outcome into sink calls
fn emit(sink: &dyn MetricsSink, outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Success { status, .. } => {
            sink.increment_counter(metric_names::SUCCESS, 1.0);
            sink.increment_counter(metric_names::STATUS_CODE, f64::from(status.as_u16()));
        }
        ProbeOutcome::Failure { status, .. } => {
            sink.increment_counter(metric_names::FAILURE, 1.0);
            sink.increment_counter(metric_names::STATUS_CODE, f64::from(status.as_u16()));
        }
        ProbeOutcome::TransportError(e) => {
            sink.increment_counter(metric_names::EXCEPTION, 1.0);
            sink.report_error(e);
        }
        ProbeOutcome::UnexpectedError(e) => {
            sink.increment_counter(metric_names::UNEXPECTED_ERROR, 1.0);
            sink.report_error(e);
        }
        ProbeOutcome::Cancelled => {}
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

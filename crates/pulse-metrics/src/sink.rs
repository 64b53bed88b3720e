//! Metrics sink interface and forwarding sinks

use pulse_core::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Destination for the counters and errors produced by the poll loop
///
/// Implementations must be cheap and must not block: they are called inline
/// from the loop between the request and the sleep.
pub trait MetricsSink: Send + Sync + fmt::Debug {
    /// Add `value` to the named counter
    fn increment_counter(&self, name: &str, value: f64);

    /// Record an error event
    fn report_error(&self, error: &Error);
}

impl<S: MetricsSink + ?Sized> MetricsSink for Arc<S> {
    fn increment_counter(&self, name: &str, value: f64) {
        (**self).increment_counter(name, value);
    }

    fn report_error(&self, error: &Error) {
        (**self).report_error(error);
    }
}

/// Sink that emits every metric as a structured `tracing` event
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    app_name: Option<String>,
}

impl TracingSink {
    /// Create a new tracing sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every event with an application name
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

impl MetricsSink for TracingSink {
    fn increment_counter(&self, name: &str, value: f64) {
        debug!(
            target: "pulse::metrics",
            app = self.app_name.as_deref().unwrap_or_default(),
            metric = name,
            value,
            "Metric recorded"
        );
    }

    fn report_error(&self, error: &Error) {
        warn!(
            target: "pulse::metrics",
            app = self.app_name.as_deref().unwrap_or_default(),
            error = %error,
            "Error reported"
        );
    }
}

/// Sink that forwards to several sinks in order
#[derive(Debug, Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanoutSink {
    /// Create an empty fanout
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of attached sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are attached
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for FanoutSink {
    fn increment_counter(&self, name: &str, value: f64) {
        for sink in &self.sinks {
            sink.increment_counter(name, value);
        }
    }

    fn report_error(&self, error: &Error) {
        for sink in &self.sinks {
            sink.report_error(error);
        }
    }
}

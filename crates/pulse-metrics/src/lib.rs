//! Metrics sinks for the Pulse endpoint prober
//!
//! - [`MetricsSink`]: the interface the poll loop reports through
//! - [`MetricsCollector`]: in-memory counters and recent errors
//! - [`TracingSink`]: structured log events per metric
//! - [`FanoutSink`]: forwards to several sinks
//! - [`PrometheusExporter`]: text exposition of a collector

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub mod collector;
pub mod prometheus;
pub mod sink;
pub mod snapshot;

pub use collector::{CounterValue, ErrorRecord, MetricsCollector};
pub use prometheus::PrometheusExporter;
pub use sink::{FanoutSink, MetricsSink, TracingSink};
pub use snapshot::{CounterMetrics, MetricsSnapshot};

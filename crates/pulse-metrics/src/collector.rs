//! In-memory metrics collector

use super::*;
use crate::sink::MetricsSink;
use chrono::{DateTime, Utc};
use pulse_core::Error;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Number of error records kept for inspection
pub const MAX_RECENT_ERRORS: usize = 100;

/// Aggregated value of a named counter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CounterValue {
    /// Number of increments
    pub count: u64,
    /// Sum of all increments
    pub sum: f64,
    /// Most recent increment
    pub last: f64,
}

impl CounterValue {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.last = value;
    }
}

/// A reported error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// When the error was reported
    pub timestamp: DateTime<Utc>,
    /// Rendered error message
    pub message: String,
    /// Whether the HTTP exchange never completed
    pub transport: bool,
}

/// Collector that keeps counters and recent errors in memory
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    counters: Arc<DashMap<String, CounterValue>>,
    recent_errors: Arc<parking_lot::Mutex<VecDeque<ErrorRecord>>>,
    total_errors: Arc<AtomicU64>,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
            recent_errors: Arc::new(parking_lot::Mutex::new(VecDeque::with_capacity(
                MAX_RECENT_ERRORS,
            ))),
            total_errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Current value of a counter
    pub fn counter(&self, name: &str) -> Option<CounterValue> {
        self.counters.get(name).map(|entry| *entry.value())
    }

    /// Number of increments recorded for a counter
    pub fn count(&self, name: &str) -> u64 {
        self.counter(name).map(|c| c.count).unwrap_or(0)
    }

    /// Sum of increments recorded for a counter
    pub fn sum(&self, name: &str) -> f64 {
        self.counter(name).map(|c| c.sum).unwrap_or(0.0)
    }

    /// Last value recorded for a counter
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.counter(name).map(|c| c.last)
    }

    /// Names of all counters, sorted
    pub fn counter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.counters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Total number of reported errors
    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    /// Most recent errors, oldest first
    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.lock().iter().cloned().collect()
    }

    /// Seconds since the collector was created
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Snapshot of the current state
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_collector(self)
    }

    /// Clear all counters and errors
    pub fn reset(&self) {
        self.counters.clear();
        self.recent_errors.lock().clear();
        self.total_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for MetricsCollector {
    fn increment_counter(&self, name: &str, value: f64) {
        self.counters
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn report_error(&self, error: &Error) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);

        let mut errors = self.recent_errors.lock();
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.pop_front();
        }
        errors.push_back(ErrorRecord {
            timestamp: Utc::now(),
            message: error.to_string(),
            transport: error.is_transport(),
        });
    }
}

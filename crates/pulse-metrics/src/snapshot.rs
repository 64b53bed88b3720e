//! Metrics snapshot for exporting current state

use crate::collector::{CounterValue, ErrorRecord, MetricsCollector};
use chrono::{DateTime, Utc};
use pulse_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Snapshot of a single counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterMetrics {
    /// Counter name
    pub name: String,
    /// Aggregated value
    #[serde(flatten)]
    pub value: CounterValue,
}

/// Complete metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Seconds since the collector was created
    pub uptime_seconds: u64,
    /// Counters, sorted by name
    pub counters: Vec<CounterMetrics>,
    /// Total number of reported errors
    pub total_errors: u64,
    /// Most recent errors, oldest first
    pub recent_errors: Vec<ErrorRecord>,
}

impl MetricsSnapshot {
    /// Create a snapshot from a metrics collector
    pub fn from_collector(collector: &MetricsCollector) -> Self {
        let counters = collector
            .counter_names()
            .into_iter()
            .filter_map(|name| {
                collector
                    .counter(&name)
                    .map(|value| CounterMetrics { name, value })
            })
            .collect();

        Self {
            timestamp: Utc::now(),
            uptime_seconds: collector.uptime_seconds(),
            counters,
            total_errors: collector.total_errors(),
            recent_errors: collector.recent_errors(),
        }
    }

    /// Look up a counter by name
    pub fn counter(&self, name: &str) -> Option<&CounterValue> {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    /// Write the snapshot as pretty JSON, replacing `path` atomically
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Metrics(format!("Failed to serialize metrics snapshot: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path).map_err(|e| {
            Error::Metrics(format!("Failed to move snapshot file into place: {e}"))
        })?;
        Ok(())
    }
}

//! Prometheus text exposition
//!
//! Counter names are lowercased and non-alphanumeric characters replaced, so
//! `EndpointCall.Success` becomes `pulse_endpointcall_success_total`.
//! `EndpointCall.StatusCode` is exported as a gauge holding the last status.

use crate::collector::MetricsCollector;
use pulse_core::{metric_names, Error, Result};
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

const PREFIX: &str = "pulse";

/// Metrics recorded as "last value" rather than accumulated
const GAUGES: [&str; 1] = [metric_names::STATUS_CODE];

/// Prometheus metrics exporter
#[derive(Debug)]
pub struct PrometheusExporter;

impl PrometheusExporter {
    /// Export metrics in Prometheus text format
    pub fn export(collector: &MetricsCollector) -> String {
        let mut output = String::with_capacity(1024);
        // Writing into a String cannot fail.
        let _ = Self::write_counters(&mut output, collector)
            .and_then(|_| Self::write_process_metrics(&mut output, collector));
        output
    }

    /// Write the exposition to a textfile-collector file
    ///
    /// The content is written next to `path` first and renamed into place so
    /// a scraper never reads a partial file.
    pub fn write_textfile(collector: &MetricsCollector, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        fs::write(&tmp, Self::export(collector))?;
        fs::rename(&tmp, path).map_err(|e| {
            Error::Metrics(format!("Failed to move metrics file into place: {e}"))
        })?;
        Ok(())
    }

    fn write_counters(output: &mut String, collector: &MetricsCollector) -> fmt::Result {
        for name in collector.counter_names() {
            let Some(value) = collector.counter(&name) else {
                continue;
            };
            let metric = Self::metric_name(&name);

            if GAUGES.contains(&name.as_str()) {
                writeln!(output, "# HELP {metric} Last recorded {name}")?;
                writeln!(output, "# TYPE {metric} gauge")?;
                writeln!(output, "{metric} {}", value.last)?;
            } else {
                writeln!(output, "# HELP {metric}_total Total of {name}")?;
                writeln!(output, "# TYPE {metric}_total counter")?;
                writeln!(output, "{metric}_total {}", value.sum)?;
            }
        }
        Ok(())
    }

    fn write_process_metrics(output: &mut String, collector: &MetricsCollector) -> fmt::Result {
        writeln!(output, "# HELP {PREFIX}_errors_reported_total Errors forwarded to the sink")?;
        writeln!(output, "# TYPE {PREFIX}_errors_reported_total counter")?;
        writeln!(output, "{PREFIX}_errors_reported_total {}", collector.total_errors())?;

        writeln!(output, "# HELP {PREFIX}_uptime_seconds Seconds since startup")?;
        writeln!(output, "# TYPE {PREFIX}_uptime_seconds gauge")?;
        writeln!(output, "{PREFIX}_uptime_seconds {}", collector.uptime_seconds())?;
        Ok(())
    }

    fn metric_name(name: &str) -> String {
        let sanitized: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{PREFIX}_{sanitized}")
    }
}

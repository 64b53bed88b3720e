//! Configuration types
//!
//! Field aliases accept the PascalCase section and key names used by
//! `appsettings.json` files, so both of these are valid:
//!
//! ```yaml
//! application:
//!   endpoint_url: "http://localhost:8080/health"
//!   interval_seconds: 30
//! ```
//!
//! ```json
//! { "ApplicationSettings": { "EndpointUrl": "http://localhost:8080/health", "IntervalSeconds": 30 } }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default probe target
pub const DEFAULT_ENDPOINT_URL: &str = "https://httpbin.org/delay/1";
/// Default delay between probes
pub const DEFAULT_INTERVAL_SECONDS: u64 = 30;
/// Default request timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Probe settings
    #[serde(default, alias = "ApplicationSettings")]
    pub application: ApplicationConfig,

    /// Monitoring backend credentials
    #[serde(default, alias = "NewRelic")]
    pub monitoring: MonitoringConfig,

    /// Observability
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Probe settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationConfig {
    /// URL requested on every iteration
    #[serde(default = "default_endpoint_url", alias = "EndpointUrl")]
    pub endpoint_url: String,

    /// Delay between the end of one probe and the start of the next
    #[serde(default = "default_interval_seconds", alias = "IntervalSeconds")]
    pub interval_seconds: u64,

    /// Upper bound for a single request
    #[serde(default = "default_timeout_seconds", alias = "TimeoutSeconds")]
    pub timeout_seconds: u64,

    /// Follow redirects before classifying the response status
    #[serde(default = "default_follow_redirects", alias = "FollowRedirects")]
    pub follow_redirects: bool,
}

impl ApplicationConfig {
    /// Interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            interval_seconds: default_interval_seconds(),
            timeout_seconds: default_timeout_seconds(),
            follow_redirects: default_follow_redirects(),
        }
    }
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

fn default_interval_seconds() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_follow_redirects() -> bool {
    true
}

/// Monitoring backend credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MonitoringConfig {
    /// License key for the monitoring backend
    #[serde(default, alias = "LicenseKey")]
    pub license_key: Option<String>,

    /// Application name reported to the monitoring backend
    #[serde(default, alias = "AppName")]
    pub app_name: Option<String>,
}

impl MonitoringConfig {
    /// License key with everything but the last four characters hidden
    pub fn masked_license_key(&self) -> Option<String> {
        self.license_key.as_deref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 4 {
                "*".repeat(chars.len())
            } else {
                let visible: String = chars[chars.len() - 4..].iter().collect();
                format!("{}{}", "*".repeat(chars.len() - 4), visible)
            }
        })
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ObservabilityConfig {
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.application.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(config.application.interval(), Duration::from_secs(30));
        assert_eq!(config.application.timeout(), Duration::from_secs(10));
        assert!(config.application.follow_redirects);
        assert_eq!(config.observability.logging.level, "info");
        assert_eq!(config.observability.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_masked_license_key() {
        let monitoring = MonitoringConfig {
            license_key: Some("abcdef123456".to_string()),
            app_name: None,
        };
        assert_eq!(monitoring.masked_license_key().unwrap(), "********3456");

        let short = MonitoringConfig {
            license_key: Some("abc".to_string()),
            app_name: None,
        };
        assert_eq!(short.masked_license_key().unwrap(), "***");

        assert!(MonitoringConfig::default().masked_license_key().is_none());
    }
}

//! Configuration builder

use crate::types::{Config, LogFormat};

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probe target
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.application.endpoint_url = url.into();
        self
    }

    /// Set the poll interval in seconds
    pub fn interval_seconds(mut self, secs: u64) -> Self {
        self.config.application.interval_seconds = secs;
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.config.application.timeout_seconds = secs;
        self
    }

    /// Follow redirects before classifying
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.application.follow_redirects = follow;
        self
    }

    /// Set the monitoring application name
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.monitoring.app_name = Some(name.into());
        self
    }

    /// Set the monitoring license key
    pub fn license_key(mut self, key: impl Into<String>) -> Self {
        self.config.monitoring.license_key = Some(key.into());
        self
    }

    /// Set log level and format
    pub fn logging(mut self, level: impl Into<String>, format: LogFormat) -> Self {
        self.config.observability.logging.level = level.into();
        self.config.observability.logging.format = format;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> pulse_core::Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}

//! Configuration validation

use crate::Config;
use pulse_core::{Error, Result};
use url::Url;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_application(config)?;

    validate_logging(config)?;

    Ok(())
}

fn validate_application(config: &Config) -> Result<()> {
    let app = &config.application;

    if app.endpoint_url.trim().is_empty() {
        return Err(Error::Config("endpoint_url cannot be empty".to_string()));
    }

    let url = Url::parse(&app.endpoint_url).map_err(|e| {
        Error::Config(format!("Invalid endpoint_url '{}': {e}", app.endpoint_url))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::Config(format!(
                "Unsupported endpoint_url scheme: {scheme} (must be http or https)"
            )));
        }
    }

    if app.interval_seconds == 0 {
        return Err(Error::Config("interval_seconds must be > 0".to_string()));
    }

    if app.timeout_seconds == 0 {
        return Err(Error::Config("timeout_seconds must be > 0".to_string()));
    }

    if app.timeout_seconds > 300 {
        tracing::warn!("timeout_seconds is very high (>5 minutes)");
    }

    if app.timeout_seconds > app.interval_seconds {
        tracing::warn!(
            timeout_seconds = app.timeout_seconds,
            interval_seconds = app.interval_seconds,
            "Request timeout exceeds the poll interval"
        );
    }

    Ok(())
}

fn validate_logging(config: &Config) -> Result<()> {
    match config.observability.logging.level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        level => Err(Error::Config(format!(
            "Invalid log level: {level} (must be trace, debug, info, warn or error)"
        ))),
    }
}

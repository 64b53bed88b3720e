//! Configuration loading

use crate::{Config, ConfigFormat};
use pulse_core::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Overrides `application.endpoint_url`
pub const ENV_ENDPOINT_URL: &str = "ENDPOINT_URL";
/// Overrides `application.interval_seconds`
pub const ENV_INTERVAL_SECONDS: &str = "INTERVAL_SECONDS";
/// Overrides `application.timeout_seconds`
pub const ENV_TIMEOUT_SECONDS: &str = "TIMEOUT_SECONDS";

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {e}", path.display())))?;

    let format = ConfigFormat::from_path(path)?;

    load_from_str(&content, format)
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::with_capacity(content.len());
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match env::var(var_name) {
            Ok(val) => val,
            Err(_) => match default_value {
                Some(default) => default.to_string(),
                None => {
                    return Err(Error::Config(format!(
                        "Environment variable '{var_name}' not set and no default provided"
                    )));
                }
            },
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let expanded_content = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Apply overrides from the process environment
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |name| env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup
///
/// Empty values are skipped. Numeric values that do not parse as a positive
/// integer are skipped with a warning and the existing value is kept.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = lookup(ENV_ENDPOINT_URL) {
        debug!(var = ENV_ENDPOINT_URL, "Applying environment override");
        config.application.endpoint_url = url.trim().to_string();
    }

    // A bad numeric value keeps the file (or default) value, not the default.
    if let Some(secs) = lookup(ENV_INTERVAL_SECONDS).and_then(|v| parse_seconds(ENV_INTERVAL_SECONDS, &v)) {
        debug!(var = ENV_INTERVAL_SECONDS, secs, "Applying environment override");
        config.application.interval_seconds = secs;
    }

    if let Some(secs) = lookup(ENV_TIMEOUT_SECONDS).and_then(|v| parse_seconds(ENV_TIMEOUT_SECONDS, &v)) {
        debug!(var = ENV_TIMEOUT_SECONDS, secs, "Applying environment override");
        config.application.timeout_seconds = secs;
    }
}

fn parse_seconds(var: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(secs),
        _ => {
            warn!(var = var, value = value, "Ignoring override: expected a positive integer");
            None
        }
    }
}

/// Resolve the effective configuration
///
/// Reads `path` when given (defaults otherwise), applies environment
/// overrides, then validates the result.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => {
            debug!("No configuration file, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config);

    crate::validator::validate_config(&config)?;

    Ok(config)
}

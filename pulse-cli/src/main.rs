//! Pulse CLI

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pulse_config::{load_config, load_from_file, Config, LogFormat, LoggingConfig};
use pulse_metrics::{FanoutSink, MetricsCollector, PrometheusExporter, TracingSink};
use pulse_runtime::{LoopReport, PollLoop, ShutdownSignal, SignalHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Config file picked up from the working directory when none is given
const DEFAULT_CONFIG_FILE: &str = "appsettings.json";

/// How long an in-flight probe may delay exit after shutdown is triggered
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Periodic HTTP endpoint prober", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the endpoint until interrupted
    Run {
        /// Path to configuration file (YAML, TOML or JSON)
        #[arg(short, long, env = "PULSE_CONFIG")]
        config: Option<PathBuf>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long)]
        log_level: Option<String>,

        /// Log output format
        #[arg(long, value_enum)]
        log_format: Option<LogFormatArg>,

        /// Write Prometheus text metrics to this file on shutdown
        #[arg(long)]
        metrics_file: Option<PathBuf>,

        /// Write a JSON metrics summary to this file on shutdown
        #[arg(long)]
        summary_file: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, env = "PULSE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            log_level,
            log_format,
            metrics_file,
            summary_file,
        } => {
            let config_path = resolve_config_path(config);

            // Logging settings come from the file, before overrides and
            // validation run, so their warnings are not lost.
            let mut logging = config_path
                .as_deref()
                .and_then(|path| load_from_file(path).ok())
                .map(|c| c.observability.logging)
                .unwrap_or_default();
            if let Some(level) = log_level {
                logging.level = level;
            }
            if let Some(format) = log_format {
                logging.format = format.into();
            }
            init_tracing(&logging)?;

            let config = load_config(config_path.as_deref())?;
            let outputs = ShutdownOutputs {
                metrics_file,
                summary_file,
            };
            run(config, config_path.as_deref(), outputs).await
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            let config_path = resolve_config_path(config);
            match &config_path {
                Some(path) => tracing::info!("Validating configuration: {}", path.display()),
                None => tracing::info!("Validating defaults and environment overrides"),
            }

            match load_config(config_path.as_deref()) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Endpoint: {}", cfg.application.endpoint_url);
                    tracing::info!("  Interval: {}s", cfg.application.interval_seconds);
                    tracing::info!("  Timeout: {}s", cfg.application.timeout_seconds);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Pulse endpoint prober");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

/// Files written once the loop has stopped
#[derive(Debug, Default)]
struct ShutdownOutputs {
    metrics_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

async fn run(config: Config, config_path: Option<&Path>, outputs: ShutdownOutputs) -> Result<()> {
    tracing::info!("Starting periodic endpoint prober");
    match config_path {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file, using defaults and environment"),
    }

    tracing::info!(
        endpoint = %config.application.endpoint_url,
        interval_secs = config.application.interval_seconds,
        timeout_secs = config.application.timeout_seconds,
        "Configuration loaded"
    );
    tracing::info!(
        app_name = config.monitoring.app_name.as_deref().unwrap_or("-"),
        license_key = config.monitoring.masked_license_key().as_deref().unwrap_or("-"),
        "Monitoring settings"
    );

    let collector = MetricsCollector::new();
    let mut tracing_sink = TracingSink::new();
    if let Some(app_name) = &config.monitoring.app_name {
        tracing_sink = tracing_sink.with_app_name(app_name.clone());
    }
    let sink = FanoutSink::new()
        .with(Arc::new(collector.clone()))
        .with(Arc::new(tracing_sink));

    let poll_loop = PollLoop::from_config(&config, Arc::new(sink))?;

    let signal = ShutdownSignal::new();
    let handler = SignalHandler::new(signal.clone());
    tokio::spawn(async move {
        if let Err(e) = handler.run().await {
            tracing::error!("Failed to install signal handlers: {}", e);
        }
    });

    tracing::info!("Press Ctrl+C to stop");
    let mut handle = tokio::spawn(poll_loop.run(signal.token()));

    let report = tokio::select! {
        result = &mut handle => Some(result?),
        _ = signal.wait() => match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(result) => Some(result?),
            Err(_) => {
                tracing::warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "Poll loop did not stop in time, abandoning it"
                );
                handle.abort();
                None
            }
        },
    };

    if let Some(report) = report {
        log_report(&report);
    }

    if let Some(path) = outputs.metrics_file {
        match PrometheusExporter::write_textfile(&collector, &path) {
            Ok(()) => tracing::info!("Metrics written to {}", path.display()),
            Err(e) => tracing::error!("Failed to write metrics to {}: {}", path.display(), e),
        }
    }

    if let Some(path) = outputs.summary_file {
        match collector.snapshot().write_json(&path) {
            Ok(()) => tracing::info!("Metrics summary written to {}", path.display()),
            Err(e) => tracing::error!("Failed to write summary to {}: {}", path.display(), e),
        }
    }

    tracing::info!("Application stopped");
    Ok(())
}

fn log_report(report: &LoopReport) {
    tracing::info!(
        iterations = report.iterations,
        successes = report.successes,
        failures = report.failures,
        transport_errors = report.transport_errors,
        unexpected_errors = report.unexpected_errors,
        "Probe summary"
    );
}

/// Explicit path, else `appsettings.json` in the working directory if present
fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    })
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
    }

    Ok(())
}

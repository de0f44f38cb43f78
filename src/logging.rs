use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::{self, File};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the process-wide tracing subscriber for an embedder of this layer.
///
/// Writes to the configured log file (if any) and optionally mirrors to
/// stdout. Fails if a global subscriber is already installed.
pub fn setup_global_logging(config: &LoggingConfig) -> Result<()> {
    let filter = format!("{},cadence={}", config.level, config.level);

    let file_layer = match &config.log_path {
        Some(log_path) => {
            if let Some(parent) = log_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(log_path)?;
            let layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::builder().parse(&filter)?);
            Some(layer)
        }
        None => None,
    };

    let stdout_layer = if config.with_stdout {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_ansi(true)
            .with_filter(EnvFilter::builder().parse(&filter)?);
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

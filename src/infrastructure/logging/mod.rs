// Logging module - Logging infrastructure
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::config::LogConfig;
use crate::domain::error::{SerconError, SerconResult};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    format!("sercon={},warn", level)
}

/// Initialize logging system.
///
/// The terminal belongs to the console, so diagnostics go to a file.
pub fn init_logging(config: &LogConfig) -> SerconResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .map_err(|e| SerconError::config(format!(
            "Failed to open log file {}: {}",
            config.file.display(),
            e
        )))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .try_init()
        .map_err(|e| SerconError::config(format!("Failed to install logger: {}", e)))?;

    tracing::info!("Sercon logging system initialized");
    Ok(())
}

//! Logging system configuration and initialization
//!
//! Console logging via `tracing-subscriber` with an env-filter, plus an
//! optional daily-rotated file layer for unattended (cron) runs.
//! `RUST_LOG` always wins over the configured level.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the process lifetime.
static LOG_GUARDS: Lazy<Mutex<Vec<non_blocking::WorkerGuard>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Default log directory: `logs/` next to the executable, falling back
/// to the working directory.
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize the logging system from the crawler configuration.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mso_crawler={}", config.level)));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true);

    if config.file_output {
        let log_dir = config
            .log_dir
            .clone()
            .unwrap_or_else(get_log_directory);
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = rolling::daily(&log_dir, "crawler.log");
        let (file_writer, guard) = non_blocking(file_appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(file_writer);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        info!("Logging initialized (console + file in {:?})", log_dir);
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()?;
    }

    Ok(())
}

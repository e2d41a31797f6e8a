//! Logging to stderr and to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Platform-specific log directory.
///
/// `RESIDENCY_LOG_DIR` overrides it. Otherwise:
/// - macOS: `~/Library/Application Support/residency/logs`
/// - Linux: `~/.local/share/residency/logs` (or `$XDG_DATA_HOME/residency/logs`)
/// - Windows: `%APPDATA%\residency\data\logs`
/// - Fallback: `./logs`
pub fn log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("RESIDENCY_LOG_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("", "", "residency")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the whole program.
pub fn setup_logging() -> Result<WorkerGuard> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "residency.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Log file: {}", log_dir.join("residency.log").display());
    Ok(guard)
}

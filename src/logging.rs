//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to a daily rotating file so they never mix with command output.
//! Tokens are only ever logged in masked form. `ytsetup show` only reads
//! the settings file and does not log at all.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "ytsetup=info,warn";

/// Initialize the logging system.
///
/// # Log Directory
///
/// Logs are stored in the platform-specific local data directory:
/// - Linux: `~/.local/share/ytsetup/logs/`
/// - macOS: `~/Library/Application Support/ytsetup/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\ytsetup\logs\`
///
/// # Log Levels
///
/// Configure via `RUST_LOG`, e.g. `RUST_LOG=ytsetup=debug` to see every
/// probed candidate address and redirect hop.
///
/// The settings file in use is recorded in the first line of each run, so
/// a log can be matched to the configuration it came from.
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// or if a global subscriber is already set.
pub fn init(settings_path: Option<&Path>) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "ytsetup.log");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        settings = %settings_label(settings_path),
        "ytsetup starting"
    );
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("ytsetup").join("logs"))
}

fn settings_label(settings_path: Option<&Path>) -> String {
    match settings_path {
        Some(path) => path.display().to_string(),
        None => "<no settings directory>".to_string(),
    }
}

/// Get the path where logs are stored, for showing to users.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

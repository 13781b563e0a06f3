//! File logging for the TUI.
//!
//! The terminal belongs to ratatui, so every tracing event goes to a
//! daily-rotated file instead. The directory and the filter can both be
//! overridden from the environment.

use std::env;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "LAZYISSUES_LOG_DIR";

/// Environment variable holding filter directives, checked before `RUST_LOG`.
pub const LOG_FILTER_ENV: &str = "LAZYISSUES_LOG";

const DEFAULT_LOG_FILTER: &str = "lazyissues=info,warn";

const LOG_FILE_PREFIX: &str = "lazyissues.log";

/// Install the global tracing subscriber.
///
/// Directives come from `LAZYISSUES_LOG`, then `RUST_LOG`, then
/// `lazyissues=info,warn`. Directives that fail to parse are replaced by the
/// default and reported in the log once the subscriber is up.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    let log_dir = resolve_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let directives = filter_directives();
    let (filter, rejected) = match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(e)),
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(e) = rejected {
        warn!(%directives, error = %e, "Ignoring invalid log filter");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "lazyissues starting");
    debug!(log_dir = %log_dir.display(), "Logging to file");

    Ok(())
}

/// The directory log files are written to, if one can be determined.
pub fn log_directory() -> Option<PathBuf> {
    resolve_log_directory().ok()
}

pub fn shutdown() {
    info!("lazyissues exiting");
}

fn resolve_log_directory() -> anyhow::Result<PathBuf> {
    if let Some(dir) = non_empty_env(LOG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;
    Ok(base.join("lazyissues").join("logs"))
}

fn filter_directives() -> String {
    non_empty_env(LOG_FILTER_ENV)
        .or_else(|| non_empty_env(EnvFilter::DEFAULT_ENV))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

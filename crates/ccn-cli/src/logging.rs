//! Log setup: a daily-rotated file next to the ledger.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::Config;

/// Log files kept, counting the current day's.
const RETAINED_LOG_FILES: usize = 2;

/// Initializes tracing for a hook invocation.
///
/// Hooks run without a terminal the user watches, so output goes to
/// `<log_dir>/ccnotify.<date>.log`, or stderr if that directory is unusable.
pub fn init(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    match file_appender(&config.log_dir) {
        Ok(appender) => {
            let _ = builder.with_writer(appender).try_init();
        }
        Err(err) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            tracing::warn!(error = %format!("{err:#}"), "log directory unavailable, logging to stderr");
        }
    }
}

fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("ccnotify")
        .filename_suffix("log")
        .max_log_files(RETAINED_LOG_FILES)
        .build(log_dir)
        .context("failed to open log file")
}

//! Logging setup: a daily-rolling file under the storage root's `logs/`.
//!
//! `MEET_RECORDER_LOG` takes an `EnvFilter` directive (default `info`);
//! `MEET_RECORDER_DEBUG_LOG=1` forces `debug`. Stdout stays reserved for
//! command output.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "meet-recorder.log";
const FILTER_ENV: &str = "MEET_RECORDER_LOG";
const DEBUG_ENV: &str = "MEET_RECORDER_DEBUG_LOG";

/// Returns the appender guard; dropping it flushes and stops file logging.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = build_filter();

    if let Err(err) = fs_err::create_dir_all(logs_dir) {
        // No log directory: fall back to stderr rather than losing errors.
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Some(guard)
}

fn build_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

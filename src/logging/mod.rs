//! Diagnostic logging to disk.
//!
//! The terminal is owned by the UI, so `tracing` output goes to a daily file
//! named `chainvote_<date>.log` in the configured log directory (default:
//! `~/.local/share/chainvote/logs/`). `RUST_LOG` overrides the configured
//! filter level.

use crate::config::expand_home;
use crate::config::model::LoggingConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Returns the log file path, or `None` when
/// logging is disabled.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }

    let log_dir = expand_home(&config.log_dir);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let path = log_dir.join(log_file_name(chrono::Local::now().date_naive()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(Some(path))
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("chainvote_{}.log", date.format("%Y-%m-%d"))
}

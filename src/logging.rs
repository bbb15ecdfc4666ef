//! Logging setup for the churnguard binary.
//!
//! Console output goes to stderr so that command output on stdout stays
//! machine-readable. Unless disabled, two daily-rotated files are written
//! as well:
//!
//! - `churnguard.<date>.log`: everything that passes the filter
//! - `warnings.<date>.log`: warnings and errors only
//!
//! ```no_run
//! use churnguard::logging::{self, LogOptions};
//!
//! logging::init(&LogOptions::default()).expect("Failed to initialize logging");
//! tracing::info!("Pipeline started");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const MAX_LOG_FILES: usize = 10;

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is not set.
    pub default_level: String,
    /// Overrides [`get_log_dir`].
    pub log_dir: Option<PathBuf>,
    pub file_logging: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_level: "info".to_owned(),
            log_dir: None,
            file_logging: true,
        }
    }
}

/// Platform data directory + `churnguard/logs`, created on demand.
///
/// - Windows: `%APPDATA%/churnguard/logs`
/// - macOS: `~/Library/Application Support/churnguard/logs`
/// - Linux: `~/.local/share/churnguard/logs`
///
/// # Errors
///
/// Returns an error if there is no data directory or it cannot be created.
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("churnguard").join("logs");
    ensure_dir(log_dir)
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    Ok(dir)
}

fn appender(dir: &std::path::Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

/// Install the global subscriber. Call once, at startup.
///
/// # Errors
///
/// Returns an error if the filter is invalid or the log files cannot be set up.
pub fn init(options: &LogOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.default_level))
        .context("Failed to create env filter")?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let (all_layer, warn_layer, log_dir) = if options.file_logging {
        let log_dir = match &options.log_dir {
            Some(dir) => ensure_dir(dir.clone())?,
            None => get_log_dir()?,
        };

        let all_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(appender(&log_dir, "churnguard")?);

        let warn_layer = fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(appender(&log_dir, "warnings")?)
            .with_filter(EnvFilter::new("warn"));

        (Some(all_layer), Some(warn_layer), Some(log_dir))
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_layer)
        .with(warn_layer)
        .try_init()
        .context("A global subscriber is already installed")?;

    if let Some(dir) = log_dir {
        tracing::debug!(log_dir = %dir.display(), "Logging initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appender_creates_dir_and_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log_dir = ensure_dir(dir.path().join("logs"))?;
        assert!(log_dir.is_dir());
        let _appender = appender(&log_dir, "churnguard")?;
        Ok(())
    }
}

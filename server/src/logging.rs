//! Console logging, optionally mirrored to rotating files in a log directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_PREFIX: &str = "wled-sync";
const LOG_SUFFIX: &str = "log";

/// How often the log file is rolled over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPeriod {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

const ROTATION_NAMES: &[(&str, RotationPeriod)] = &[
    ("minutely", RotationPeriod::Minutely),
    ("minute", RotationPeriod::Minutely),
    ("hourly", RotationPeriod::Hourly),
    ("hour", RotationPeriod::Hourly),
    ("daily", RotationPeriod::Daily),
    ("day", RotationPeriod::Daily),
    ("never", RotationPeriod::Never),
    ("none", RotationPeriod::Never),
];

impl std::str::FromStr for RotationPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ROTATION_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, period)| *period)
            .ok_or_else(|| {
                format!("Invalid rotation period '{s}'. Valid options: minutely, hourly, daily, never")
            })
    }
}

impl From<RotationPeriod> for Rotation {
    fn from(period: RotationPeriod) -> Self {
        match period {
            RotationPeriod::Minutely => Rotation::MINUTELY,
            RotationPeriod::Hourly => Rotation::HOURLY,
            RotationPeriod::Daily => Rotation::DAILY,
            RotationPeriod::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: String,
    pub log_prefix: String,
    pub rotation: RotationPeriod,
    /// 0 keeps every file.
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: ".".to_string(),
            log_prefix: LOG_PREFIX.to_string(),
            rotation: RotationPeriod::Daily,
            max_log_files: 7,
        }
    }
}

/// Keeps the non-blocking file writer alive. Dropping it flushes pending lines.
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Console output only, filtered by `RUST_LOG`.
pub fn setup_console_logging() -> LogGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    LogGuard { _guards: vec![] }
}

/// Console output plus a rotating file in `config.log_dir`.
pub fn setup_dual_logging(config: LogConfig) -> std::io::Result<LogGuard> {
    let log_dir = Path::new(&config.log_dir);
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(&config.log_prefix)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.max_log_files)
        .build(log_dir)
        .map_err(std::io::Error::other)?;
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = Layer::default()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = Layer::default()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(file_layer)
        .with(console_layer)
        .init();

    // Runs after init so removal failures reach the log.
    if config.max_log_files > 0 {
        let removed = cleanup_old_logs(log_dir, &config.log_prefix, config.max_log_files)?;
        debug!("Removed {removed} old log files from {}", log_dir.display());
    }

    Ok(LogGuard {
        _guards: vec![file_guard],
    })
}

fn is_log_file(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(LOG_SUFFIX))
        .is_some_and(|middle| middle.ends_with('.'))
}

/// `<prefix>*.log` files in `log_dir`, newest first.
fn log_files_newest_first(log_dir: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(log_dir)?.flatten() {
        let name = entry.file_name();
        if !name.to_str().is_some_and(|name| is_log_file(name, prefix)) {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            files.push((modified, entry.path()));
        }
    }
    files.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Removes the oldest log files beyond `max_files` and returns how many went.
fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_files: usize) -> std::io::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for path in log_files_newest_first(log_dir, prefix)?.into_iter().skip(max_files) {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {}: {e}", path.display()),
        }
    }
    Ok(removed)
}

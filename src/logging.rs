//! File-backed `tracing` setup. The terminal belongs to the UI, so log lines
//! go to a file (default `<data_dir>/syllabot/syllabot.log`).

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub log_file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_file: default_log_path(),
        }
    }
}

impl LogConfig {
    /// 0 → info, 1 → debug, 2+ → trace.
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.log_file = path;
        }
        self
    }
}

pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("syllabot")
        .join("syllabot.log")
}

/// Installs the global subscriber. Call once, before the terminal is taken over.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .init();
    Ok(())
}

/// `RUST_LOG` wins; otherwise our crate logs at `level` and dependencies at warn.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,syllabot={level}"))
    })
}

//! Logging setup for the application.

use crate::config::{GlobalLogLevel, ProgressLogLevel, Settings};
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Log target used for progress reports.
pub const PROGRESS_TARGET: &str = "tile_collapse::progress";

impl From<GlobalLogLevel> for LevelFilter {
    fn from(level: GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

impl From<ProgressLogLevel> for log::Level {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

/// Initializes the logger from the resolved settings.
///
/// - Progress reports are filtered at `settings.progress_log_level`.
/// - Everything else uses `settings.global_log_level`.
///
/// Directives in `RUST_LOG` are applied last and win over both.
pub fn init_logger(settings: &Settings) {
    let progress_level = log::Level::from(settings.progress_log_level).to_level_filter();
    let global_level = LevelFilter::from(settings.global_log_level);

    let mut builder = Builder::new();
    builder.filter_level(global_level);
    builder.filter_module(PROGRESS_TARGET, progress_level);
    builder.parse_env(Env::default());

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping the existing one");
        return;
    }

    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        settings.global_log_level,
        settings.progress_log_level
    );
}

//! Stderr logger for the `occ` binary.
//!
//! The libraries only use the `log` facade; this is the sink the driver
//! installs. Level selection, strongest first: `--verbose`, `OCC_VERBOSE=1`,
//! `OCC_LOG=<level>`, then `warn`.

use colored::Colorize;
use log::{Level, LevelFilter};

pub struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let tag = match record.level() {
                Level::Error => "error".red().bold(),
                Level::Warn => "warn".yellow().bold(),
                Level::Info => "info".green().bold(),
                Level::Debug => "debug".blue().bold(),
                Level::Trace => "trace".dimmed(),
            };
            eprintln!("[{tag}] {}", record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

/// The level implied by the flag and the environment.
pub fn level_from_env(verbose: bool) -> LevelFilter {
    if verbose || std::env::var("OCC_VERBOSE").is_ok_and(|v| v == "1") {
        return LevelFilter::Debug;
    }
    std::env::var("OCC_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Installs the logger. A second call only adjusts the level.
pub fn init(level: LevelFilter) {
    _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

use std::sync::OnceLock;

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Minimal stderr logger so `--log debug` traces don't mix with the
/// table output on stdout.
struct StderrLogger {
    level: Level,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let timestamp = Local::now().format("%H:%M:%S");
            eprintln!("{} {} {}", timestamp, record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Parses a `--log` value. Unknown names fall back to warn so a typo
/// never aborts the run before the real work starts.
pub fn level_from_str(value: &str) -> LevelFilter {
    match value.parse::<LevelFilter>() {
        Ok(filter) => filter,
        Err(_) => {
            eprintln!(
                "unknown log level '{value}' (possible values: debug, info, warn, error, off)"
            );
            LevelFilter::Warn
        }
    }
}

pub fn init(filter: LevelFilter) -> Result<(), SetLoggerError> {
    static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

    let level = filter.to_level().unwrap_or(Level::Error);
    let logger = LOGGER.get_or_init(|| StderrLogger { level });

    log::set_logger(logger)?;
    log::set_max_level(filter);
    Ok(())
}

#![cfg(feature = "std")]

use std::env;
use std::sync::OnceLock;
use std::time::Instant;

use log::{self, Level, LevelFilter, Metadata, Record};

/// Records from other crates are kept to warnings and errors.
const OWN_TARGET: &str = "xiangqi_sync";

static STARTED: OnceLock<Instant> = OnceLock::new();

struct StderrLogger {
    level: LevelFilter,
}

fn allows(target: &str, level: Level, max: LevelFilter) -> bool {
    if target.starts_with(OWN_TARGET) {
        level <= max
    } else {
        level <= Level::Warn && level <= max
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        allows(metadata.target(), metadata.level(), self.level)
    }

    // stdout belongs to the board view
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = STARTED.get_or_init(Instant::now).elapsed();
        eprintln!(
            "{:>9.3}s {:<5} [{}] {}",
            elapsed.as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the stderr logger. The level comes from `XIANGQI_LOG` and defaults
/// to `info`; timestamps count from this call.
pub fn init_logging() {
    let level = env::var("XIANGQI_LOG")
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info);
    STARTED.get_or_init(Instant::now);
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_records_follow_the_configured_level() {
        assert!(allows("xiangqi_sync::poller", Level::Debug, LevelFilter::Debug));
        assert!(!allows("xiangqi_sync::poller", Level::Trace, LevelFilter::Debug));
    }

    #[test]
    fn foreign_records_stop_at_warnings() {
        assert!(allows("tokio::runtime", Level::Warn, LevelFilter::Trace));
        assert!(!allows("tokio::runtime", Level::Info, LevelFilter::Trace));
        assert!(!allows("tokio::runtime", Level::Warn, LevelFilter::Error));
    }
}

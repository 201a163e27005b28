//! Minimal stderr logger.
//!
//! Lines look like `[  0.012s  INFO georef_io] loaded 4 control points`.
//! Debug and info records from crates outside this workspace are hidden.
//! Install it once at startup with [`init_with_level`], or pick a level from a
//! CLI verbosity flag with [`level_for_verbosity`].

use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Crate prefix of records that are shown below `Warn`.
const OWN_TARGET: &str = "georef";

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    /// Records from dependencies are only shown at `Warn` and above, so
    /// `--verbose` progress output stays limited to this workspace.
    fn accepts(&self, level: Level, target: &str) -> bool {
        level <= self.level && (level <= Level::Warn || is_own_target(target))
    }
}

fn is_own_target(target: &str) -> bool {
    crate_of(target).starts_with(OWN_TARGET)
}

fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or_default()
}

fn format_line(elapsed: f64, level: Level, target: &str, args: &Arguments<'_>) -> String {
    format!("[{:7.3}s {:>5} {}] {}", elapsed, level, crate_of(target), args)
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.accepts(metadata.level(), metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// `Debug` when verbose progress was requested, `Warn` otherwise.
pub fn level_for_verbosity(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

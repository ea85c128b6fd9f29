//! Logging setup.
//!
//! [`init_with_level`] installs a minimal stderr logger that prints
//! `[elapsed LEVEL] message`. [`init_with_filters`] takes `RUST_LOG`-style
//! directives such as `warn,elevation_sensors_tf=debug` and installs an
//! `env_logger` instead. With the `tracing` feature, [`init_tracing`]
//! installs a `tracing-subscriber`.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5}] {}",
            elapsed,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the stderr logger at `level`.
///
/// Once installed, later calls are no-ops returning `Ok(())`. If another
/// logger already owns the `log` facade, every call reports the error.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if INSTALLED.load(Ordering::Acquire) {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    INSTALLED.store(true, Ordering::Release);
    log::set_max_level(logger.level);
    Ok(())
}

fn filter_builder(filters: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(filters).format_timestamp_millis();
    builder
}

/// Install an `env_logger` configured from `RUST_LOG`-style directives.
///
/// Malformed directives are reported by `env_logger` on stderr and skipped.
pub fn init_with_filters(filters: &str) -> Result<(), log::SetLoggerError> {
    filter_builder(filters).try_init()
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

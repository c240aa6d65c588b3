//! Logging setup for binaries and benches.
//!
//! The library itself only emits `log` records. A binary picks one backend:
//! [`init_with_level`] prints them to stderr prefixed with the time since
//! installation, level and target; with the `tracing` feature,
//! [`init_tracing`] installs a `tracing-subscriber` that also prints the
//! stage spans.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

struct StderrLogger {
    max: LevelFilter,
    since: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let t = self.since.elapsed().as_secs_f64();
            let mut out = std::io::stderr().lock();
            let _ = writeln!(
                out,
                "[{t:7.3}s {:>5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static STDERR_LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Parse `off`, `error`, `warn`, `info`, `debug` or `trace` (any case).
pub fn parse_level(name: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(name).map_err(|_| {
        format!("invalid log level '{name}', expected off|error|warn|info|debug|trace")
    })
}

/// Route `log` records at or above `level` to stderr.
///
/// Only the first call installs the logger; later calls keep its level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if STDERR_LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = STDERR_LOGGER.get_or_init(|| StderrLogger {
        max: level,
        since: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// [`parse_level`] followed by [`init_with_level`].
pub fn init_from_str(level: &str) -> Result<LevelFilter, String> {
    let filter = parse_level(level)?;
    init_with_level(filter).map_err(|e| e.to_string())?;
    Ok(filter)
}

/// Install a `tracing` subscriber writing to stderr, one line per event and
/// per closed span.
///
/// `RUST_LOG` takes precedence; without it everything at `default_level` and
/// above is shown. `log` records are forwarded by `tracing-subscriber`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, default_level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_ascii_lowercase()));
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_timer(fmt::time::Uptime::default())
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
    });
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

//! Tracing setup for the CLI.
//!
//! Logs go to stderr so they never mix with reports on stdout. Compact
//! output carries no timestamps; JSON output is stamped in RFC 3339 UTC for
//! log collectors.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TelemetryError {
    /// The configured log filter expression does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(TryInitError),
}

/// Installs the global subscriber on the first successful call.
///
/// The filter is validated on every call so a bad `--log-filter` is always
/// reported, even once a subscriber is in place.
pub(crate) fn initialise(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    TELEMETRY_GUARD
        .get_or_try_init(|| install(config.log_format(), filter))
        .map(|_| ())
}

fn install(format: LogFormat, filter: EnvFilter) -> Result<(), TelemetryError> {
    let json = matches!(format, LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(io::stderr)
    });
    let compact = matches!(format, LogFormat::Compact).then(|| {
        fmt::layer()
            .compact()
            .without_time()
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(compact)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

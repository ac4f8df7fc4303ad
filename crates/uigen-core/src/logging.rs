//! Logging initialization.
//!
//! Library code only emits `tracing` events. Hosts call [`init`] or
//! [`try_init`] once to install a subscriber writing to stderr.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{Error, Result};

/// Map a verbosity count to a level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
#[must_use]
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Build the filter: `RUST_LOG` if set, otherwise `warn`, plus a
/// `uigen=<level>` directive from the verbosity.
pub fn filter(verbosity: u8) -> Result<EnvFilter> {
    let level = level_for(verbosity);
    let directive = format!("uigen={level}")
        .parse()
        .map_err(|e| Error::Logging(format!("{e}")))?;
    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(directive))
}

/// Install the global tracing subscriber.
///
/// JSON output emits one object per line:
/// ```json
/// {"timestamp":"...","level":"INFO","target":"uigen_core::session","fields":{"message":"..."}}
/// ```
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn try_init(verbosity: u8, json: bool) -> Result<()> {
    let subscriber = tracing_subscriber::registry().with(filter(verbosity)?);

    let installed = if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| Error::Logging(e.to_string()))
}

/// Install the global subscriber, ignoring a repeated call.
pub fn init(verbosity: u8, json: bool) {
    if let Err(e) = try_init(verbosity, json) {
        tracing::debug!(error = %e, "logging already initialized");
    }
}

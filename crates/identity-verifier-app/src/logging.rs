//! Structured logging initialisation.
//!
//! The filter level can be overridden at runtime via `RUST_LOG`. When it is
//! not set, the caller-supplied `level` string is used (e.g. `"info"` or
//! `"debug,identity_verifier_gateway=trace"`).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::AppError;

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines for terminals.
    #[default]
    Human,
    /// Newline-delimited JSON for log aggregation.
    Json,
}

/// Installs the global tracing subscriber on stderr.
///
/// # Errors
/// Returns [`AppError::Logging`] when the level is unparsable or a global
/// subscriber is already installed.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|error| AppError::Logging(format!("invalid log level {level:?}: {error}")))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Human => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|error| AppError::Logging(error.to_string()))
}

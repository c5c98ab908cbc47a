use std::time::Duration;

use meridian_domain::{LoggingConfig, MeridianError, ResponseEnvelope, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if the level is
/// not a valid filter or a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| {
            MeridianError::Config(format!("invalid log level '{}': {err}", config.level))
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };

    installed.map_err(|err| {
        MeridianError::Internal(format!("failed to install tracing subscriber: {err}"))
    })
}

/// Log the outcome of a client operation with structured fields.
///
/// `operation` should be a stable identifier without sensitive data.
#[inline]
pub fn log_operation<T>(operation: &str, envelope: &ResponseEnvelope<T>, elapsed: Duration) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let status = envelope.status.unwrap_or_default();

    match &envelope.error {
        None => info!(operation, status, duration_ms, "operation_success"),
        Some(error) => warn!(operation, status, duration_ms, error = %error, "operation_failure"),
    }
}

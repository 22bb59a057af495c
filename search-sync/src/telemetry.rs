//! Tracing initialization.

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};
use crate::AppError;

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to the configured default.
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .map_err(|e| AppError::config(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| AppError::config(format!("failed to install tracing subscriber: {}", e)))
}

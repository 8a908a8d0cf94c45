//! Tracing subscriber setup for the binary.

use crate::domain::error::AlgoTraderError;
use crate::domain::settings::{LogFormat, LoggingConfig};

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "ALGOTRADER_LOG";

/// Install a global `fmt` subscriber writing to stderr. The filter comes
/// from `ALGOTRADER_LOG`, else `logging.level`. A second call is a no-op.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), AlgoTraderError> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter).map_err(|err| {
        AlgoTraderError::ConfigInvalid {
            section: "logging".into(),
            key: "level".into(),
            reason: format!("invalid log filter '{filter}': {err}"),
        }
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(logging.ansi)
        .with_writer(std::io::stderr);
    // Err only means a subscriber is already installed.
    let _ = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    Ok(())
}

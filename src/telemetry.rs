use tracing_subscriber::EnvFilter;

use crate::models::{KpiEngineError, Result};

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level).map_err(|e| {
            KpiEngineError::ConfigError(format!("invalid log level '{}': {}", log_level, e))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| KpiEngineError::ConfigError(format!("failed to install subscriber: {}", e)))
}

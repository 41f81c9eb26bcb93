//! Tracing subscriber setup for hosts embedding the engine

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{ChainBlockError, Result};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(config: &LoggingConfig) -> String {
    format!("chain_block={},warn", config.level.to_lowercase())
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| ChainBlockError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

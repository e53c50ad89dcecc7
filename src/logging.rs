use crate::error::{Result, WorkerError};
use tracing_subscriber::EnvFilter;

/// Builds the log filter. `RUST_LOG` wins over the configured level.
pub fn build_filter(configured_level: &str) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(directives).map_err(|e| WorkerError::Config {
                message: format!("Invalid RUST_LOG filter: {}", e),
            })
        }
        _ => parse_level(configured_level),
    }
}

fn parse_level(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| WorkerError::Config {
        message: format!("Invalid logging level '{}': {}", level, e),
    })
}

/// Installs the global subscriber. Log lines go to stderr so stdout stays
/// reserved for the encoded task result.
pub fn init(configured_level: &str) -> Result<()> {
    let filter = build_filter(configured_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| WorkerError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })
}

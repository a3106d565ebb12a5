//! Logging setup.
//!
//! Logs always go to stderr: under the subprocess transport the server's stdout
//! is the protocol channel.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{KaulaError, KaulaResult};

/// Builds the level filter. `RUST_LOG` takes precedence over the configured level.
pub fn env_filter(config: &LogConfig) -> KaulaResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| KaulaError::Custom(format!("Invalid log filter: {e}")))
}

/// Installs the global tracing subscriber.
pub fn init_logging(config: &LogConfig) -> KaulaResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_writer(std::io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_thread_names(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };

    installed.map_err(|e| KaulaError::Custom(format!("Failed to set global tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_builds_filter() {
        let config = LogConfig {
            level: "debug".to_string(),
            ..LogConfig::default()
        };
        assert!(env_filter(&config).is_ok());
    }
}

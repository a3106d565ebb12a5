//! Configuration module for the Kaula MCP engine.
//!
//! This module provides a layered configuration system: compiled defaults, then
//! an optional file (TOML, YAML, JSON), then environment variables prefixed with
//! `KAULA` (for example `KAULA__SESSION__REQUEST_TIMEOUT_MS=5000`). All
//! configuration values are validated before use.

use std::path::{Path, PathBuf};

use crate::error::config::ConfigError;
use config::{Config, ConfigError as ExternalConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub mod client;
pub mod server;
pub mod session;

pub use client::ClientConfig;
pub use server::{ServerConfig, TransportType};
pub use session::SessionConfig;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "KAULA";

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the configuration is valid
    /// * `Err(ConfigError)` if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration for the Kaula MCP binaries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KaulaConfig {
    /// Server endpoint configuration
    pub server: ServerConfig,

    /// Reference client configuration
    pub client: ClientConfig,

    /// Session engine configuration, shared by both sides
    pub session: SessionConfig,

    /// Log configuration
    pub log: LogConfig,
}

impl Validate for KaulaConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.client.validate()?;
        self.session.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,

    /// Whether to include source code locations in logs
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            source_location: true,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.level
            ))),
        }
    }
}

/// Configuration loader for the Kaula MCP binaries.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(None::<PathBuf>, ENV_PREFIX)
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to the configuration file
    /// * `env_prefix` - Prefix for environment variables that override configuration values
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Loads the configuration from defaults, the file and environment variables.
    ///
    /// # Returns
    ///
    /// * `Ok(KaulaConfig)` if the configuration was loaded and validated
    /// * `Err(ConfigError)` if there was an error loading the configuration
    pub fn load(&self) -> ConfigResult<KaulaConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&KaulaConfig::default())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        );

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            let name = path.to_str().ok_or_else(|| {
                ConfigError::ParseError(format!("Configuration path is not valid UTF-8: {path:?}"))
            })?;

            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("json") => FileFormat::Json,
                Some("yaml" | "yml") => FileFormat::Yaml,
                _ => {
                    return Err(ConfigError::ParseError(format!(
                        "Unsupported file extension for: {path:?}"
                    )))
                }
            };
            builder = builder.add_source(File::new(name, format));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(map_external_error)?;

        let kaula_config: KaulaConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        kaula_config.validate()?;

        Ok(kaula_config)
    }
}

fn map_external_error(err: ExternalConfigError) -> ConfigError {
    match err {
        ExternalConfigError::NotFound(path) => ConfigError::FileNotFound(PathBuf::from(path)),
        ExternalConfigError::FileParse { uri, cause } => ConfigError::ParseError(format!(
            "Error parsing config file {}: {cause}",
            uri.unwrap_or_default()
        )),
        ExternalConfigError::Message(msg) => ConfigError::ParseError(msg),
        other => ConfigError::ParseError(other.to_string()),
    }
}

/// Serializes a configuration as TOML.
pub fn to_toml(config: &KaulaConfig) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))
}

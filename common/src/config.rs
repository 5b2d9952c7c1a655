// Configuration management with layered configuration (file, env)

use crate::errors::PollerError;
use crate::scheduler::FixedDelayConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    #[serde(default = "default_initial_delay_millis")]
    pub initial_delay_millis: u64,
    #[serde(default = "default_delay_millis")]
    pub delay_millis: u64,
    #[serde(default)]
    pub ignore_deletes_from_source: bool,
}

fn default_initial_delay_millis() -> u64 {
    crate::scheduler::fixed_delay::DEFAULT_INITIAL_DELAY_MILLIS
}

fn default_delay_millis() -> u64 {
    crate::scheduler::fixed_delay::DEFAULT_DELAY_MILLIS
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            initial_delay_millis: default_initial_delay_millis(),
            delay_millis: default_delay_millis(),
            ignore_deletes_from_source: false,
        }
    }
}

impl PollerSettings {
    pub fn to_fixed_delay_config(&self) -> FixedDelayConfig {
        FixedDelayConfig::new(
            self.initial_delay_millis,
            self.delay_millis,
            self.ignore_deletes_from_source,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), PollerError> {
        if self.poller.delay_millis == 0 {
            return Err(PollerError::InvalidConfiguration(
                "poller delay_millis must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(PollerError::InvalidConfiguration(
                "server port must be greater than 0".to_string(),
            ));
        }

        if self.observability.log_level.trim().is_empty() {
            return Err(PollerError::InvalidConfiguration(
                "log_level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

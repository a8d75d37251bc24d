//! Application Configuration using Figment
//!
//! Configuration is loaded from:
//! 1. A TOML file (default `labinstr.toml`)
//! 2. Environment variables prefixed with `LABINSTR_`, nested keys separated
//!    by `__` (e.g. `LABINSTR_LOG_LEVEL=debug`)
//!
//! # Example
//!
//! ```toml
//! log_level = "info"
//!
//! [[devices]]
//! id = "psu"
//! driver = "hmc8043"
//!
//! [devices.connection]
//! type = "tcp"
//! host = "192.168.1.20"
//! ```

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use instr_core::config::DeviceConfig;
use instr_core::driver::DriverRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "labinstr.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "LABINSTR_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Error types for config loading and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Unknown log level
    #[error("Invalid log_level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Two devices share an id
    #[error("Duplicate device id: {0}")]
    DuplicateId(String),

    /// A device names a driver that is not linked in
    #[error("Device '{device}' uses unknown driver '{driver}'")]
    UnknownDriver {
        /// Device id
        device: String,
        /// Requested driver type
        driver: String,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Configured instruments
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            devices: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, with environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }
        debug!("Loading config from: {}", path.display());

        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(
            "Loaded config: {} device(s) from {}",
            config.devices.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse a TOML string. Environment overrides are not applied.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Figment::from(Toml::string(content))
            .extract()
            .context("Failed to parse TOML content")
    }

    /// Check log level, device id uniqueness and driver availability.
    pub fn validate(&self, drivers: &DriverRegistry) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        let mut ids = HashSet::new();
        for device in &self.devices {
            if !ids.insert(device.id.as_str()) {
                return Err(ConfigError::DuplicateId(device.id.clone()));
            }
            if !drivers.has_factory(&device.driver) {
                return Err(ConfigError::UnknownDriver {
                    device: device.id.clone(),
                    driver: device.driver.clone(),
                });
            }
        }
        Ok(())
    }

    /// Device by id.
    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// All enabled devices.
    pub fn enabled_devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.iter().filter(|d| d.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use instr_core::config::ConnectionConfig;

    const TWO_DEVICES: &str = r#"
log_level = "debug"

[[devices]]
id = "psu"
driver = "hmc8043"

[devices.connection]
type = "tcp"
host = "192.168.1.20"

[[devices]]
id = "chopper"
driver = "mc2000b"
enabled = false

[devices.connection]
type = "serial"
port = "/dev/ttyUSB0"
"#;

    fn drivers() -> DriverRegistry {
        instr_drivers::registry()
    }

    #[test]
    fn test_parse() {
        let config = AppConfig::from_toml_str(TWO_DEVICES).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.devices.len(), 2);
        assert!(matches!(
            config.device("psu").unwrap().connection,
            ConnectionConfig::Tcp { port: None, .. }
        ));
        assert_eq!(
            config.enabled_devices().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            ["psu"]
        );
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validate_duplicate_id() {
        let mut config = AppConfig::from_toml_str(TWO_DEVICES).unwrap();
        config.devices[1].id = "psu".to_string();
        assert_eq!(
            config.validate(&drivers()),
            Err(ConfigError::DuplicateId("psu".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_driver() {
        let mut config = AppConfig::from_toml_str(TWO_DEVICES).unwrap();
        config.devices[0].driver = "hmc9000".to_string();
        assert!(matches!(
            config.validate(&drivers()),
            Err(ConfigError::UnknownDriver { driver, .. }) if driver == "hmc9000"
        ));
    }

    #[test]
    fn test_validate_log_level() {
        let config = AppConfig {
            log_level: "verbose".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(&drivers()),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("labinstr.toml", TWO_DEVICES)?;
            jail.set_env("LABINSTR_LOG_LEVEL", "warn");

            let config = AppConfig::load(Path::new("labinstr.toml"))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(config.log_level, "warn");
            assert_eq!(config.devices.len(), 2);
            Ok(())
        });
    }
}

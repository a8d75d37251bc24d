//! Instrument Factory Pattern
//!
//! Each driver crate exports one [`InstrumentFactory`] per instrument model.
//! A factory supplies the model's command table and connection defaults, and
//! may run a post-connect handshake. [`DriverRegistry`] maps driver type
//! names (the `driver` field in configuration) to factories and opens
//! configured devices.
//!
//! # Example
//!
//! ```rust,ignore
//! use instr_core::driver::{DriverRegistry, InstrumentFactory};
//!
//! let mut drivers = DriverRegistry::new();
//! drivers.register_factory(Box::new(Hmc8043Factory));
//!
//! let mut psu = drivers.open(&device_config)?;
//! psu.set("voltage", 5.0)?;
//! ```

use crate::config::{ConnectionConfig, DeviceConfig};
use crate::error::RegistrationError;
use crate::framing::{FramedTransport, ResponseFraming};
use crate::instrument::Instrument;
use crate::registry::{ParameterRegistry, Session};
use crate::transport::{
    DynTransport, MockTransport, SerialSettings, TcpTransport, Terminators, DEFAULT_SCPI_PORT,
    DEFAULT_TIMEOUT,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Link parameters a driver expects unless configuration overrides them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDefaults {
    /// Command and response terminators
    pub terminators: Terminators,
    /// Serial line settings
    pub serial: SerialSettings,
    /// Response framing
    pub framing: ResponseFraming,
    /// Response timeout
    pub timeout: Duration,
    /// TCP port
    pub tcp_port: u16,
}

impl Default for ConnectionDefaults {
    /// SCPI over `\n`, 9600 8N1, plain framing, port 5025.
    fn default() -> Self {
        Self {
            terminators: Terminators::default(),
            serial: SerialSettings::default(),
            framing: ResponseFraming::Plain,
            timeout: DEFAULT_TIMEOUT,
            tcp_port: DEFAULT_SCPI_PORT,
        }
    }
}

/// Factory for one instrument model.
pub trait InstrumentFactory: Send + Sync + 'static {
    /// Driver type name used in the `driver` field of configuration.
    fn driver_type(&self) -> &'static str;

    /// Human-readable model name, e.g. "Rohde & Schwarz HMC8043".
    fn name(&self) -> &'static str;

    /// Link parameters for this model.
    fn connection(&self) -> ConnectionDefaults {
        ConnectionDefaults::default()
    }

    /// Check driver-specific options before connecting.
    fn validate(&self, options: &toml::Table) -> Result<()> {
        let _ = options;
        Ok(())
    }

    /// Build the model's command table.
    fn build_registry(&self) -> Result<ParameterRegistry, RegistrationError>;

    /// Post-connect handshake (language check, reset, data format).
    fn initialize(&self, session: &mut Session<'_>, options: &toml::Table) -> Result<()> {
        let _ = (session, options);
        Ok(())
    }
}

/// Introspection record for a registered factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryInfo {
    /// Driver type name
    pub driver_type: String,
    /// Model name
    pub name: String,
}

/// Driver type → factory table.
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<String, Box<dyn InstrumentFactory>>,
}

impl DriverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, returning any factory it replaces.
    pub fn register_factory(
        &mut self,
        factory: Box<dyn InstrumentFactory>,
    ) -> Option<Box<dyn InstrumentFactory>> {
        let driver_type = factory.driver_type().to_string();
        tracing::debug!(
            driver_type = %driver_type,
            name = %factory.name(),
            "Registering driver factory"
        );
        self.factories.insert(driver_type, factory)
    }

    /// Factory for `driver_type`.
    pub fn factory(&self, driver_type: &str) -> Option<&dyn InstrumentFactory> {
        self.factories.get(driver_type).map(|f| f.as_ref())
    }

    /// True if a factory is registered for `driver_type`.
    pub fn has_factory(&self, driver_type: &str) -> bool {
        self.factories.contains_key(driver_type)
    }

    /// Registered driver types, sorted.
    pub fn driver_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Introspection records, sorted by driver type.
    pub fn factory_info(&self) -> Vec<FactoryInfo> {
        self.factories
            .values()
            .map(|f| FactoryInfo {
                driver_type: f.driver_type().to_string(),
                name: f.name().to_string(),
            })
            .collect()
    }

    fn require(&self, driver_type: &str) -> Result<&dyn InstrumentFactory> {
        self.factory(driver_type).with_context(|| {
            format!(
                "Unknown driver type '{}' (available: {})",
                driver_type,
                self.driver_types().join(", ")
            )
        })
    }

    /// Command table of `driver_type`, without connecting.
    pub fn build_registry(&self, driver_type: &str) -> Result<ParameterRegistry> {
        let factory = self.require(driver_type)?;
        factory
            .build_registry()
            .with_context(|| format!("Invalid command table in driver '{}'", driver_type))
    }

    /// Open the transport described by `config`, applying driver defaults.
    pub fn connect(&self, config: &DeviceConfig) -> Result<DynTransport> {
        let factory = self.require(&config.driver)?;
        let defaults = factory.connection();
        open_transport(&config.connection, &defaults)
            .with_context(|| format!("Failed to connect device '{}'", config.id))
    }

    /// Connect and initialize a configured device.
    pub fn open(&self, config: &DeviceConfig) -> Result<Instrument<DynTransport>> {
        if !config.enabled {
            anyhow::bail!("Device '{}' is disabled", config.id);
        }
        let transport = self.connect(config)?;
        self.open_with(config, transport)
    }

    /// Initialize a device over a caller-supplied transport.
    pub fn open_with(
        &self,
        config: &DeviceConfig,
        transport: DynTransport,
    ) -> Result<Instrument<DynTransport>> {
        let factory = self.require(&config.driver)?;
        factory
            .validate(&config.options)
            .with_context(|| format!("Invalid options for device '{}'", config.id))?;
        let registry = self.build_registry(&config.driver)?;

        let mut instrument = Instrument::new(config.id.clone(), registry, transport);
        factory
            .initialize(&mut instrument.session(), &config.options)
            .with_context(|| format!("Failed to initialize device '{}'", config.id))?;
        instrument.connect_message();

        tracing::info!(
            device = %config.id,
            driver = %config.driver,
            connection = %config.connection.describe(),
            "Device ready"
        );
        Ok(instrument)
    }
}

fn terminators(
    defaults: &ConnectionDefaults,
    write: &Option<String>,
    read: &Option<String>,
) -> Terminators {
    Terminators {
        write: write.clone().unwrap_or_else(|| defaults.terminators.write.clone()),
        read: read.clone().unwrap_or_else(|| defaults.terminators.read.clone()),
    }
}

fn timeout(defaults: &ConnectionDefaults, timeout_ms: Option<u64>) -> Duration {
    timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.timeout)
}

fn framed(transport: DynTransport, framing: &ResponseFraming) -> DynTransport {
    match framing {
        ResponseFraming::Plain => transport,
        other => Box::new(FramedTransport::new(transport, other.clone())),
    }
}

/// Open a transport from configuration.
///
/// Mock connections answer with logical payloads and are never framed.
pub fn open_transport(
    connection: &ConnectionConfig,
    defaults: &ConnectionDefaults,
) -> Result<DynTransport> {
    match connection {
        ConnectionConfig::Mock { responses } => {
            let mock = MockTransport::new();
            for (command, response) in responses {
                mock.respond_to(command.clone(), response.clone());
            }
            Ok(Box::new(mock))
        }

        ConnectionConfig::Tcp {
            host,
            port,
            timeout_ms,
            write_terminator,
            read_terminator,
        } => {
            let transport = TcpTransport::connect(
                host,
                port.unwrap_or(defaults.tcp_port),
                terminators(defaults, write_terminator, read_terminator),
                timeout(defaults, *timeout_ms),
            )?;
            Ok(framed(Box::new(transport), &defaults.framing))
        }

        #[cfg(feature = "serial")]
        ConnectionConfig::Serial {
            port,
            baud_rate,
            data_bits,
            parity,
            stop_bits,
            timeout_ms,
            write_terminator,
            read_terminator,
        } => {
            let base = &defaults.serial;
            let settings = SerialSettings {
                baud_rate: baud_rate.unwrap_or(base.baud_rate),
                data_bits: data_bits.unwrap_or(base.data_bits),
                parity: parity.clone().unwrap_or_else(|| base.parity.clone()),
                stop_bits: stop_bits.unwrap_or(base.stop_bits),
            };
            let transport = crate::transport::SerialTransport::open(
                port,
                &settings,
                terminators(defaults, write_terminator, read_terminator),
                timeout(defaults, *timeout_ms),
            )?;
            Ok(framed(Box::new(transport), &defaults.framing))
        }

        #[cfg(not(feature = "serial"))]
        ConnectionConfig::Serial { port, .. } => {
            anyhow::bail!(
                "Serial port '{}' requested but serial support is not enabled (feature `serial`)",
                port
            )
        }
    }
}

//! Device configuration
//!
//! One `[[devices]]` entry per physical instrument:
//!
//! ```toml
//! [[devices]]
//! id = "psu"
//! driver = "hmc8043"
//!
//! [devices.connection]
//! type = "tcp"
//! host = "192.168.1.20"
//!
//! [[devices]]
//! id = "chopper"
//! driver = "mc2000b"
//!
//! [devices.connection]
//! type = "serial"
//! port = "/dev/ttyUSB0"
//!
//! [[devices]]
//! id = "dmm"
//! driver = "keithley_6500"
//! options = { reset_device = true }
//!
//! [devices.connection]
//! type = "mock"
//! responses = { "*LANG?" = "SCPI" }
//! ```
//!
//! Anything left out of a connection (baud rate, terminators, timeout) is
//! taken from the driver's [`ConnectionDefaults`](crate::driver::ConnectionDefaults).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configured instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique identifier used on the command line
    pub id: String,
    /// Driver type, e.g. `hmc8043`
    pub driver: String,
    /// Disabled devices are skipped
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// How to reach the instrument
    pub connection: ConnectionConfig,
    /// Driver-specific options
    #[serde(default)]
    pub options: toml::Table,
}

fn default_enabled() -> bool {
    true
}

/// Transport selection and overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionConfig {
    /// RS-232 / USB-CDC port
    Serial {
        /// Port path (`/dev/ttyUSB0`, `COM3`)
        port: String,
        /// Overrides the driver's baud rate
        #[serde(default)]
        baud_rate: Option<u32>,
        /// Overrides data bits
        #[serde(default)]
        data_bits: Option<u8>,
        /// Overrides parity (`none`, `odd`, `even`)
        #[serde(default)]
        parity: Option<String>,
        /// Overrides stop bits
        #[serde(default)]
        stop_bits: Option<u8>,
        /// Overrides the response timeout
        #[serde(default)]
        timeout_ms: Option<u64>,
        /// Overrides the write terminator
        #[serde(default)]
        write_terminator: Option<String>,
        /// Overrides the read terminator
        #[serde(default)]
        read_terminator: Option<String>,
    },

    /// Raw SCPI socket
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Defaults to 5025
        #[serde(default)]
        port: Option<u16>,
        /// Overrides the response timeout
        #[serde(default)]
        timeout_ms: Option<u64>,
        /// Overrides the write terminator
        #[serde(default)]
        write_terminator: Option<String>,
        /// Overrides the read terminator
        #[serde(default)]
        read_terminator: Option<String>,
    },

    /// Scripted in-memory transport
    Mock {
        /// Fixed response per query
        #[serde(default)]
        responses: BTreeMap<String, String>,
    },
}

impl ConnectionConfig {
    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            ConnectionConfig::Serial { port, .. } => format!("serial:{}", port),
            ConnectionConfig::Tcp { host, port, .. } => match port {
                Some(p) => format!("tcp:{}:{}", host, p),
                None => format!("tcp:{}", host),
            },
            ConnectionConfig::Mock { .. } => "mock".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices() {
        #[derive(Deserialize)]
        struct Doc {
            devices: Vec<DeviceConfig>,
        }

        let doc: Doc = toml::from_str(
            r#"
            [[devices]]
            id = "psu"
            driver = "hmc8043"
            connection = { type = "tcp", host = "10.0.0.2" }

            [[devices]]
            id = "chopper"
            driver = "mc2000b"
            enabled = false
            options = { note = "bench 3" }
            connection = { type = "serial", port = "/dev/ttyUSB0", baud_rate = 115200 }
            "#,
        )
        .unwrap();

        assert_eq!(doc.devices.len(), 2);
        assert!(doc.devices[0].enabled);
        assert_eq!(doc.devices[0].connection.describe(), "tcp:10.0.0.2");
        assert!(!doc.devices[1].enabled);
        assert!(matches!(
            doc.devices[1].connection,
            ConnectionConfig::Serial { baud_rate: Some(115200), .. }
        ));
        assert_eq!(doc.devices[1].options["note"].as_str(), Some("bench 3"));
    }
}

//! Serial port transport (RS-232 / USB-CDC).
//!
//! [`SerialSettings`] is always available so configuration can describe
//! serial devices; opening a port requires the `serial` feature.

use serde::{Deserialize, Serialize};

#[cfg(feature = "serial")]
use super::line::{LineTransport, Terminators};
#[cfg(feature = "serial")]
use super::Transport;
#[cfg(feature = "serial")]
use crate::error::TransportError;
#[cfg(feature = "serial")]
use anyhow::{Context, Result};
#[cfg(feature = "serial")]
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
#[cfg(feature = "serial")]
use std::time::Duration;

/// Poll interval of the port itself; the response deadline is separate.
#[cfg(feature = "serial")]
const PORT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Serial line settings. Defaults to 9600 8N1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    /// `none`, `odd` or `even`
    pub parity: String,
    /// 1 or 2
    pub stop_bits: u8,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: "none".to_string(),
            stop_bits: 1,
        }
    }
}

impl SerialSettings {
    /// 8N1 at the given baud rate.
    pub fn with_baud(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

#[cfg(feature = "serial")]
impl SerialSettings {
    fn data_bits(&self) -> Result<DataBits> {
        Ok(match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => anyhow::bail!("Unsupported data bits: {}", other),
        })
    }

    fn parity(&self) -> Result<Parity> {
        Ok(match self.parity.to_ascii_lowercase().as_str() {
            "none" | "n" => Parity::None,
            "odd" | "o" => Parity::Odd,
            "even" | "e" => Parity::Even,
            other => anyhow::bail!("Unsupported parity: {}", other),
        })
    }

    fn stop_bits(&self) -> Result<StopBits> {
        Ok(match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => anyhow::bail!("Unsupported stop bits: {}", other),
        })
    }
}

/// Line transport over an open serial port.
#[cfg(feature = "serial")]
pub struct SerialTransport {
    port_name: String,
    inner: LineTransport<Box<dyn SerialPort>>,
}

#[cfg(feature = "serial")]
impl SerialTransport {
    /// Open `port_name` with the given settings.
    pub fn open(
        port_name: &str,
        settings: &SerialSettings,
        terminators: Terminators,
        timeout: Duration,
    ) -> Result<Self> {
        let port = serialport::new(port_name, settings.baud_rate)
            .data_bits(settings.data_bits()?)
            .parity(settings.parity()?)
            .stop_bits(settings.stop_bits()?)
            .flow_control(serialport::FlowControl::None)
            .timeout(PORT_POLL_TIMEOUT)
            .open()
            .with_context(|| {
                format!(
                    "Failed to open serial port '{}' at {} baud",
                    port_name, settings.baud_rate
                )
            })?;

        tracing::info!(
            "Serial port '{}' opened at {} baud",
            port_name,
            settings.baud_rate
        );

        let mut transport = Self {
            port_name: port_name.to_string(),
            inner: LineTransport::new(port, terminators).with_timeout(timeout),
        };
        // Drop anything the device printed before we connected
        transport
            .clear()
            .with_context(|| format!("Failed to clear serial port '{}'", port_name))?;
        Ok(transport)
    }

    /// Port path (e.g. `/dev/ttyUSB0`, `COM3`).
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(feature = "serial")]
impl Transport for SerialTransport {
    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        self.inner.send(command)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.inner.query(command)
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        self.inner.receive()
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        self.inner.clear()?;
        self.inner
            .get_mut()
            .clear(ClearBuffer::All)
            .map_err(|e| TransportError::Io(e.into()))
    }
}

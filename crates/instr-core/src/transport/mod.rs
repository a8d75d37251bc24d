//! Transport Abstractions
//!
//! The registry only ever calls blocking `send`/`query` on an already-open
//! session. Connection setup (port, baud rate, socket address, terminators)
//! belongs to the transport implementations here.
//!
//! # Implementations
//!
//! - [`LineTransport`]: terminator-delimited request/response over any
//!   `Read + Write` stream, with a response deadline
//! - [`SerialTransport`]: RS-232 / USB-CDC ports (requires `serial` feature)
//! - [`TcpTransport`]: raw SCPI sockets (port 5025 by default)
//! - [`MockTransport`]: scripted responses for tests and dry runs
//!
//! Device-specific echo/prompt handling lives in [`crate::framing`] as a
//! wrapper around any of these.

mod line;
mod mock;
mod serial;
mod tcp;

pub use line::{LineTransport, Terminators, DEFAULT_TIMEOUT};
pub use mock::{Exchange, MockTransport};
pub use serial::SerialSettings;
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
pub use tcp::{TcpTransport, DEFAULT_SCPI_PORT};

use crate::error::TransportError;

/// Blocking request/response link to one instrument.
///
/// Implementations strip line terminators from responses. One outstanding
/// request at a time; callers serialize access.
pub trait Transport: Send {
    /// Write a command without reading a response.
    fn send(&mut self, command: &str) -> Result<(), TransportError>;

    /// Write a command and read one terminated response.
    fn query(&mut self, command: &str) -> Result<String, TransportError>;

    /// Read one further terminated response without writing.
    fn receive(&mut self) -> Result<String, TransportError> {
        Err(TransportError::Unsupported("receive"))
    }

    /// Discard any pending, unread input.
    fn clear(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        (**self).send(command)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        (**self).query(command)
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        (**self).receive()
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        (**self).clear()
    }
}

/// Type-erased transport, as produced by configuration.
pub type DynTransport = Box<dyn Transport>;

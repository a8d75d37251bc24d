//! Raw SCPI socket transport.

use super::line::{LineTransport, Terminators};
use super::Transport;
use crate::error::TransportError;
use anyhow::{Context, Result};
use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Conventional raw SCPI port (LXI instruments).
pub const DEFAULT_SCPI_PORT: u16 = 5025;

/// Connection timeout for the initial TCP handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Socket poll interval; the response deadline is separate.
const SOCKET_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Line transport over a TCP socket.
pub struct TcpTransport {
    peer: String,
    inner: LineTransport<TcpStream>,
}

impl TcpTransport {
    /// Connect to `host:port`.
    pub fn connect(
        host: &str,
        port: u16,
        terminators: Terminators,
        timeout: Duration,
    ) -> Result<Self> {
        let peer = format!("{}:{}", host, port);
        let addr = peer
            .to_socket_addrs()
            .with_context(|| format!("Invalid address: {}", peer))?
            .next()
            .with_context(|| format!("No address resolved for {}", peer))?;

        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
            .with_context(|| format!("Failed to connect to {}", peer))?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(SOCKET_POLL_TIMEOUT))?;

        tracing::info!("Connected to {}", peer);

        Ok(Self {
            peer,
            inner: LineTransport::new(stream, terminators).with_timeout(timeout),
        })
    }

    /// `host:port` of the instrument.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl Transport for TcpTransport {
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

        let stream = self.inner.get_mut();
        stream.set_nonblocking(true)?;
        let mut discard = [0u8; 256];
        let drained = loop {
            match stream.read(&mut discard) {
                Ok(0) => break Err(TransportError::Closed),
                Ok(n) => tracing::debug!("Flushed {} stale bytes from stream", n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => break Err(TransportError::Io(e)),
            }
        };
        stream.set_nonblocking(false)?;
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_query_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "*IDN?\n");
            writer.write_all(b"Keysight Technologies,B2902B,MY1,1.0\n").unwrap();
        });

        let mut t = TcpTransport::connect(
            "127.0.0.1",
            port,
            Terminators::default(),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(
            t.query("*IDN?").unwrap(),
            "Keysight Technologies,B2902B,MY1,1.0"
        );
        server.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let result = TcpTransport::connect(
            "127.0.0.1",
            port,
            Terminators::default(),
            Duration::from_millis(100),
        );
        assert!(result.is_err());
    }
}

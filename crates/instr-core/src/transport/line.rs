//! Terminator-delimited request/response over a byte stream.

use super::Transport;
use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// Default response timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Line terminators for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminators {
    /// Appended to every outgoing command
    pub write: String,
    /// Marks the end of an incoming response
    pub read: String,
}

impl Terminators {
    /// Same terminator in both directions.
    pub fn symmetric(terminator: impl Into<String>) -> Self {
        let t = terminator.into();
        Self {
            write: t.clone(),
            read: t,
        }
    }

    /// Distinct write and read terminators.
    pub fn new(write: impl Into<String>, read: impl Into<String>) -> Self {
        Self {
            write: write.into(),
            read: read.into(),
        }
    }
}

impl Default for Terminators {
    /// `\n` both ways, the SCPI convention.
    fn default() -> Self {
        Self::symmetric("\n")
    }
}

/// Line protocol over any `Read + Write` stream.
///
/// Responses are accumulated until the read terminator arrives or the
/// deadline passes. Bytes after the terminator are kept for the next read.
/// The stream's own read timeout should be short (tens of milliseconds);
/// the overall deadline is enforced here.
pub struct LineTransport<S> {
    stream: S,
    terminators: Terminators,
    timeout: Duration,
    pending: Vec<u8>,
}

impl<S: Read + Write> LineTransport<S> {
    /// Wrap an open stream.
    pub fn new(stream: S, terminators: Terminators) -> Self {
        Self {
            stream,
            terminators,
            timeout: DEFAULT_TIMEOUT,
            pending: Vec::new(),
        }
    }

    /// Set the response deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Response deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Configured terminators.
    pub fn terminators(&self) -> &Terminators {
        &self.terminators
    }

    /// Underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Underlying stream, mutably.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Drop buffered bytes not yet returned as a response.
    pub fn discard_pending(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    fn write_command(&mut self, command: &str) -> Result<(), TransportError> {
        let mut line = Vec::with_capacity(command.len() + self.terminators.write.len());
        line.extend_from_slice(command.as_bytes());
        line.extend_from_slice(self.terminators.write.as_bytes());
        self.stream.write_all(&line)?;
        self.stream.flush()?;
        Ok(())
    }

    fn take_line(&mut self) -> Option<String> {
        let term = self.terminators.read.as_bytes();
        if term.is_empty() {
            return None;
        }
        let pos = self
            .pending
            .windows(term.len())
            .position(|window| window == term)?;
        let line: Vec<u8> = self.pending.drain(..pos + term.len()).take(pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn read_line(&mut self, command: &str) -> Result<String, TransportError> {
        let start = Instant::now();
        let mut chunk = [0u8; 256];

        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            if start.elapsed() > self.timeout {
                return Err(TransportError::Timeout {
                    command: command.to_string(),
                    timeout: self.timeout,
                });
            }

            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                // Stream timeout is shorter than the response deadline
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }
}

impl<S: Read + Write + Send> Transport for LineTransport<S> {
    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        self.write_command(command)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.write_command(command)?;
        self.read_line(command)
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        self.read_line("<receive>")
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        let n = self.discard_pending();
        if n > 0 {
            tracing::debug!("Discarded {} stale bytes", n);
        }
        Ok(())
    }
}

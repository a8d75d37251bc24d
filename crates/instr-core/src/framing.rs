//! Response framing for devices that echo commands.
//!
//! Some serial instruments (Thorlabs controllers) echo every command back
//! before answering, and some end each exchange with a prompt sentinel.
//! [`FramedTransport`] extracts the payload by structure, not by fixed
//! offsets, and rejects responses that do not follow the contract.
//!
//! | Framing | Wire exchange | Payload |
//! |---|---|---|
//! | `Plain` | `500` | `500` |
//! | `EchoPrompt { prompt: ">" }` | `freq?\r500\r>` | text between the echo and the prompt |
//! | `EchoLine` | `channel?` then `2` | the line after the echo line |

use crate::error::TransportError;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};

/// Framing contract of one device's responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFraming {
    /// Responses are the payload.
    #[default]
    Plain,
    /// The response starts with the echoed command and ends with `prompt`.
    /// The prompt is usually also the read terminator, in which case the
    /// transport has already consumed it.
    EchoPrompt {
        /// Trailing sentinel, e.g. `>`
        prompt: String,
    },
    /// The device echoes the command on its own line; the payload is the
    /// next line.
    EchoLine,
}

impl ResponseFraming {
    /// Extract the payload of a single-line response to `command`.
    pub fn extract(&self, command: &str, raw: &str) -> Result<String, TransportError> {
        match self {
            ResponseFraming::Plain | ResponseFraming::EchoLine => Ok(raw.trim().to_string()),
            ResponseFraming::EchoPrompt { prompt } => {
                let framing_error = |reason: &str| TransportError::Framing {
                    command: command.to_string(),
                    reason: reason.to_string(),
                    raw: raw.to_string(),
                };

                // A prompt left over from the previous exchange may precede the echo
                let mut body = raw.trim_start();
                if !prompt.is_empty() {
                    body = body.trim_start_matches(prompt.as_str()).trim_start();
                }
                let body = body
                    .strip_prefix(command.trim())
                    .ok_or_else(|| framing_error("missing command echo"))?;

                let mut body = body.trim();
                if !prompt.is_empty() {
                    if let Some(stripped) = body.strip_suffix(prompt.as_str()) {
                        body = stripped.trim_end();
                    }
                    if body.contains(prompt.as_str()) {
                        return Err(framing_error("prompt inside payload"));
                    }
                }
                Ok(body.to_string())
            }
        }
    }
}

/// Applies a [`ResponseFraming`] to every exchange of an inner transport.
///
/// Echoing devices also answer writes, so `send` reads and discards the
/// echo (and prompt) to keep the next query aligned. Pending input is
/// cleared before each exchange.
pub struct FramedTransport<T> {
    inner: T,
    framing: ResponseFraming,
}

impl<T: Transport> FramedTransport<T> {
    /// Wrap `inner`.
    pub fn new(inner: T, framing: ResponseFraming) -> Self {
        Self { inner, framing }
    }

    /// Framing in effect.
    pub fn framing(&self) -> &ResponseFraming {
        &self.framing
    }

    /// Unwrap the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn expect_echo(&mut self, command: &str) -> Result<(), TransportError> {
        let echo = self.inner.query(command)?;
        if echo.trim() != command.trim() {
            return Err(TransportError::Framing {
                command: command.to_string(),
                reason: "expected command echo".to_string(),
                raw: echo,
            });
        }
        Ok(())
    }
}

impl<T: Transport> Transport for FramedTransport<T> {
    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        match &self.framing {
            ResponseFraming::Plain => self.inner.send(command),
            ResponseFraming::EchoPrompt { .. } => {
                self.inner.clear()?;
                let raw = self.inner.query(command)?;
                self.framing.extract(command, &raw).map(|_| ())
            }
            ResponseFraming::EchoLine => {
                self.inner.clear()?;
                self.expect_echo(command)
            }
        }
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        match &self.framing {
            ResponseFraming::Plain => self.inner.query(command),
            ResponseFraming::EchoPrompt { .. } => {
                self.inner.clear()?;
                let raw = self.inner.query(command)?;
                self.framing.extract(command, &raw)
            }
            ResponseFraming::EchoLine => {
                self.inner.clear()?;
                self.expect_echo(command)?;
                Ok(self.inner.receive()?.trim().to_string())
            }
        }
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        self.inner.receive()
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        self.inner.clear()
    }
}

//! Error types for parameter registration, access and transport I/O.
//!
//! Every failure is surfaced to the caller as a typed error; nothing is
//! silently defaulted.
//!
//! ## Error Hierarchy
//!
//! - **`RegistrationError`**: raised while building an instrument's command
//!   table. These are programming errors in a driver and are caught at
//!   construction time, before any transport exists.
//! - **`GetError`** / **`SetError`** / **`CallError`**: raised by the
//!   registry's `get`, `set` and `call` operations. Validation variants
//!   (`InvalidValue`, `InvalidArgument`, `UnmappedResponse`, `ParseError`) are
//!   detected locally; when raised on the write path no byte has reached the
//!   instrument.
//! - **`TransportError`**: raised by the transport collaborator and passed
//!   through unmodified via `#[from]`.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while registering parameters or functions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A parameter or function with this name is already registered.
    #[error("Parameter '{0}' is already registered")]
    DuplicateName(String),

    /// The spec has neither a get nor a set strategy.
    #[error("Parameter '{0}' has neither a get nor a set strategy")]
    IncompleteSpec(String),

    /// A value mapping was combined with a validator or a parser.
    #[error("Parameter '{0}' combines a value mapping with a validator or parser")]
    ConflictingConversion(String),

    /// A value mapping was declared with no pairs.
    #[error("Parameter '{0}' has an empty value mapping")]
    EmptyMapping(String),

    /// A command template is malformed or has the wrong number of sites.
    #[error("Invalid command template for '{name}': {reason}")]
    InvalidTemplate {
        /// Parameter or function name
        name: String,
        /// What is wrong with the template
        reason: String,
    },
}

/// Errors raised by the transport collaborator.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying I/O failure (serial port, socket).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No terminated response arrived in time.
    #[error("Timeout after {timeout:?} waiting for response to '{command}'")]
    Timeout {
        /// Command that was awaiting a response
        command: String,
        /// Configured read timeout
        timeout: Duration,
    },

    /// The peer closed the connection.
    #[error("Connection closed by instrument")]
    Closed,

    /// The response did not follow the device's framing contract.
    #[error("Malformed response to '{command}': {reason} (raw: {raw:?})")]
    Framing {
        /// Command that produced the response
        command: String,
        /// Framing rule that was violated
        reason: String,
        /// Raw response as received
        raw: String,
    },

    /// The transport cannot perform this operation.
    #[error("Transport does not support {0}")]
    Unsupported(&'static str),

    /// A scripted mock transport ran out of responses.
    #[error("No scripted response for '{0}'")]
    NoResponse(String),
}

/// Errors raised by [`crate::registry::ParameterRegistry::get`].
#[derive(Error, Debug)]
pub enum GetError {
    /// No parameter with this name is registered.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// The parameter has no get strategy.
    #[error("Parameter '{0}' is not readable")]
    NotReadable(String),

    /// The response matched none of the known wire tokens.
    #[error("Parameter '{name}': response {response:?} matches no known wire token")]
    UnmappedResponse {
        /// Parameter name
        name: String,
        /// Trimmed response
        response: String,
    },

    /// The response could not be converted to a logical value.
    #[error("Parameter '{name}': cannot parse {response:?}: {reason}")]
    ParseError {
        /// Parameter name
        name: String,
        /// Raw response
        response: String,
        /// Parser failure description
        reason: String,
    },

    /// Transport failure, passed through unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised by [`crate::registry::ParameterRegistry::set`].
#[derive(Error, Debug)]
pub enum SetError {
    /// No parameter with this name is registered.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// The parameter has no set strategy.
    #[error("Parameter '{0}' is not settable")]
    NotSettable(String),

    /// The value is outside the parameter's domain. Nothing was sent.
    #[error("Invalid value {value} for '{name}': {reason}")]
    InvalidValue {
        /// Parameter name
        name: String,
        /// Rejected value, rendered for display
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A custom setter needed another parameter's value and reading it failed.
    #[error("Parameter '{name}' depends on a read that failed: {source}")]
    Dependency {
        /// Parameter being set
        name: String,
        /// Underlying read failure
        #[source]
        source: Box<GetError>,
    },

    /// The command template could not be formatted. Nothing was sent.
    #[error("Failed to format command for '{name}': {reason}")]
    Format {
        /// Parameter name
        name: String,
        /// Formatter failure
        reason: String,
    },

    /// Transport failure, passed through unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised by [`crate::registry::ParameterRegistry::call`].
#[derive(Error, Debug)]
pub enum CallError {
    /// No function with this name is registered.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// Wrong number of arguments.
    #[error("Function '{name}' takes {expected} argument(s), got {got}")]
    ArgumentCount {
        /// Function name
        name: String,
        /// Declared argument count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// An argument is outside its domain. Nothing was sent.
    #[error("Function '{name}' argument {index}: invalid value {value}: {reason}")]
    InvalidArgument {
        /// Function name
        name: String,
        /// Zero-based argument position
        index: usize,
        /// Rejected value, rendered for display
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The command template could not be formatted. Nothing was sent.
    #[error("Failed to format command for '{name}': {reason}")]
    Format {
        /// Function name
        name: String,
        /// Formatter failure
        reason: String,
    },

    /// Transport failure, passed through unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SetError::InvalidValue {
            name: "voltage".into(),
            value: "32.06".into(),
            reason: "outside 0..=32.05".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 32.06 for 'voltage': outside 0..=32.05"
        );
    }

    #[test]
    fn test_transport_error_passes_through() {
        let err: GetError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "Connection closed by instrument");
        assert!(matches!(err, GetError::Transport(TransportError::Closed)));
    }
}

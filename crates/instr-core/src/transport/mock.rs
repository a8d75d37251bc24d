//! Scripted transport for tests and dry runs.
//!
//! Clones share state, so a test can hand one clone to an instrument and
//! inspect the exchange log through another.
//!
//! # Example
//!
//! ```rust,ignore
//! let mock = MockTransport::new();
//! mock.push_response("15.000");
//! let mut inst = Instrument::new("psu", registry, mock.clone());
//! assert_eq!(inst.get("voltage")?, Value::Float(15.0));
//! assert_eq!(mock.queries(), ["VOLT?"]);
//! ```

use super::Transport;
use crate::error::TransportError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// `send(command)`
    Send(String),
    /// `query(command)`
    Query(String),
    /// `receive()`
    Receive,
    /// `clear()`
    Clear,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<String>,
    fixed: HashMap<String, String>,
    log: Vec<Exchange>,
}

/// In-memory [`Transport`] answering queries from a script.
///
/// Queries take the next scripted response first; when the script is empty
/// they fall back to fixed per-command responses, and fail with
/// [`TransportError::NoResponse`] otherwise.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Empty script, no fixed responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the given responses in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for r in responses {
            mock.push_response(r);
        }
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a response to the script.
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().script.push_back(response.into());
    }

    /// Answer `command` with `response` whenever the script is empty.
    pub fn respond_to(&self, command: impl Into<String>, response: impl Into<String>) {
        self.state().fixed.insert(command.into(), response.into());
    }

    /// Every recorded call, in order.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.state().log.clone()
    }

    /// Commands passed to `send`, in order.
    pub fn sent(&self) -> Vec<String> {
        self.state()
            .log
            .iter()
            .filter_map(|e| match e {
                Exchange::Send(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    /// Commands passed to `query`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.state()
            .log
            .iter()
            .filter_map(|e| match e {
                Exchange::Query(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `send`, `query` and `receive` calls.
    pub fn call_count(&self) -> usize {
        self.state()
            .log
            .iter()
            .filter(|e| !matches!(e, Exchange::Clear))
            .count()
    }

    /// Scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.state().script.len()
    }

    /// Forget recorded calls.
    pub fn reset_log(&self) {
        self.state().log.clear();
    }
}

impl Transport for MockTransport {
    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        self.state().log.push(Exchange::Send(command.to_string()));
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        let mut state = self.state();
        state.log.push(Exchange::Query(command.to_string()));
        if let Some(r) = state.script.pop_front() {
            return Ok(r);
        }
        state
            .fixed
            .get(command)
            .cloned()
            .ok_or_else(|| TransportError::NoResponse(command.to_string()))
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        let mut state = self.state();
        state.log.push(Exchange::Receive);
        state
            .script
            .pop_front()
            .ok_or_else(|| TransportError::NoResponse("<receive>".to_string()))
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        self.state().log.push(Exchange::Clear);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_fixed_then_error() {
        let mut mock = MockTransport::with_responses(["1"]);
        mock.respond_to("*IDN?", "MOCK,0,0,0");

        assert_eq!(mock.query("OUTP?").unwrap(), "1");
        assert_eq!(mock.query("*IDN?").unwrap(), "MOCK,0,0,0");
        assert!(matches!(
            mock.query("OUTP?"),
            Err(TransportError::NoResponse(cmd)) if cmd == "OUTP?"
        ));
    }

    #[test]
    fn test_clones_share_log() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();
        handle.send("*RST").unwrap();
        handle.clear().unwrap();
        assert_eq!(mock.sent(), ["*RST"]);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            mock.exchanges(),
            vec![Exchange::Send("*RST".into()), Exchange::Clear]
        );
    }
}

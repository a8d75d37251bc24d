//! An instrument: one registry bound to one exclusive transport.

use crate::error::{CallError, GetError, SetError};
use crate::registry::{ParameterRegistry, Session};
use crate::transport::Transport;
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of reading one parameter during a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    /// The parameter was read.
    Value(Value),
    /// The read failed; the message is the error's display text.
    Error(String),
}

/// A connected instrument.
///
/// Owns the command table and the transport session, so every operation on
/// one physical instrument goes through `&mut self` and is serialized.
pub struct Instrument<T> {
    name: String,
    registry: ParameterRegistry,
    transport: T,
}

impl<T> std::fmt::Debug for Instrument<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrument")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Instrument<T> {
    /// Bind `registry` to an already-open `transport`.
    pub fn new(name: impl Into<String>, registry: ParameterRegistry, transport: T) -> Self {
        Self {
            name: name.into(),
            registry,
            transport,
        }
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command table.
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Session for raw access and custom routines.
    pub fn session(&mut self) -> Session<'_> {
        self.registry.session(&mut self.transport)
    }

    /// Read a parameter.
    pub fn get(&mut self, name: &str) -> Result<Value, GetError> {
        let value = self.session().get(name)?;
        tracing::debug!(instrument = %self.name, parameter = %name, value = %value, "get");
        Ok(value)
    }

    /// Write a parameter.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SetError> {
        let value = value.into();
        self.session().set(name, &value)?;
        tracing::debug!(instrument = %self.name, parameter = %name, value = %value, "set");
        Ok(())
    }

    /// Invoke a function.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<(), CallError> {
        self.session().call(name, args)
    }

    /// Read every readable parameter, collecting failures per parameter
    /// rather than stopping at the first.
    pub fn snapshot(&mut self) -> BTreeMap<String, Reading> {
        let names: Vec<String> = self
            .registry
            .names()
            .filter(|n| self.registry.spec(n).is_some_and(|s| s.is_readable()))
            .map(str::to_string)
            .collect();

        names
            .into_iter()
            .map(|name| {
                let reading = match self.get(&name) {
                    Ok(v) => Reading::Value(v),
                    Err(e) => {
                        tracing::warn!(instrument = %self.name, parameter = %name, "snapshot read failed: {}", e);
                        Reading::Error(e.to_string())
                    }
                };
                (name, reading)
            })
            .collect()
    }

    /// Query the `identity` parameter, if any, and log it.
    pub fn connect_message(&mut self) -> Option<String> {
        if !self.registry.contains("identity") {
            return None;
        }
        match self.get("identity") {
            Ok(id) => {
                let id = id.to_string();
                tracing::info!("Connected to: {} ({})", id, self.name);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Could not read identity of {}: {}", self.name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterSpec;
    use crate::parser::ResponseParser;
    use crate::transport::MockTransport;

    fn instrument(mock: &MockTransport) -> Instrument<MockTransport> {
        let mut reg = ParameterRegistry::new();
        reg.register(ParameterSpec::new("identity").get_cmd("*IDN?")).unwrap();
        reg.register(
            ParameterSpec::new("voltage")
                .get_cmd("VOLT?")
                .parser(ResponseParser::Float),
        )
        .unwrap();
        reg.register(ParameterSpec::new("reset").set_cmd("*RST")).unwrap();
        Instrument::new("psu", reg, mock.clone())
    }

    #[test]
    fn test_snapshot_collects_errors() {
        let mock = MockTransport::with_responses(["ACME,PSU,1,1.0", "abc"]);
        let mut inst = instrument(&mock);
        let snap = inst.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap["identity"], Reading::Value(Value::from("ACME,PSU,1,1.0")));
        assert!(matches!(snap["voltage"], Reading::Error(_)));
        assert_eq!(mock.queries(), ["*IDN?", "VOLT?"]);
    }

    #[test]
    fn test_connect_message() {
        let mock = MockTransport::with_responses(["ACME,PSU,1,1.0"]);
        let mut inst = instrument(&mock);
        assert_eq!(inst.connect_message().as_deref(), Some("ACME,PSU,1,1.0"));
    }
}

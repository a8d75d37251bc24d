//! Parameter Registry
//!
//! Owns the command table of one instrument and interprets it against a
//! transport. Every parameter goes through the same pipeline:
//!
//! - **set**: mapping or validator (pure, no I/O) → template or custom setter
//!   → one `send`. A rejected value never reaches the transport.
//! - **get**: fixed query or custom getter → mapping, parser or pass-through.
//!   Nothing is cached; every `get` performs transport I/O.
//!
//! The registry holds no instrument-side state. Logic that depends on modal
//! state (selected channel, measurement mode) re-reads it through
//! [`Session::get`] inside a custom getter or setter.

use crate::error::{CallError, GetError, RegistrationError, SetError, TransportError};
use crate::function::FunctionSpec;
use crate::parameter::{GetStrategy, ParameterSpec, SetStrategy};
use crate::template::{CommandTemplate, VALUE_KEY};
use crate::transport::Transport;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;

/// A registered parameter with its compiled set template.
#[derive(Debug)]
struct Entry {
    spec: ParameterSpec,
    template: Option<CommandTemplate>,
}

#[derive(Debug)]
struct FunctionEntry {
    spec: FunctionSpec,
    template: CommandTemplate,
}

/// Serializable summary of a registered parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Physical unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Has a get strategy
    pub readable: bool,
    /// Has a set strategy
    pub settable: bool,
    /// Accepted logical values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Fixed query, if the getter is not custom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Set template, if the setter is not custom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Serializable summary of a registered function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInfo {
    /// Function name
    pub name: String,
    /// Command template
    pub command: String,
    /// Argument domains, in order
    pub args: Vec<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Name → spec table for one instrument instance.
#[derive(Debug, Default)]
pub struct ParameterRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    functions: Vec<FunctionEntry>,
    function_index: HashMap<String, usize>,
}

impl ParameterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter spec.
    ///
    /// The registry is left unchanged on error.
    pub fn register(&mut self, spec: ParameterSpec) -> Result<(), RegistrationError> {
        let name = spec.name.clone();
        if self.is_taken(&name) {
            return Err(RegistrationError::DuplicateName(name));
        }
        if !spec.is_readable() && !spec.is_settable() {
            return Err(RegistrationError::IncompleteSpec(name));
        }
        if spec.empty_mapping {
            return Err(RegistrationError::EmptyMapping(name));
        }
        if spec.mapping.is_some() && (spec.validator.is_some() || spec.parser.is_some()) {
            return Err(RegistrationError::ConflictingConversion(name));
        }

        let template = match &spec.set {
            SetStrategy::Template(source) => {
                let template = CommandTemplate::parse(source).map_err(|reason| {
                    RegistrationError::InvalidTemplate {
                        name: name.clone(),
                        reason,
                    }
                })?;
                if let Some(key) = template.keys().find(|k| *k != VALUE_KEY) {
                    return Err(RegistrationError::InvalidTemplate {
                        name,
                        reason: format!(
                            "{:?} names site '{{{}}}', parameters only substitute '{{{}}}'",
                            source, key, VALUE_KEY
                        ),
                    });
                }
                Some(template)
            }
            _ => None,
        };

        tracing::trace!(parameter = %name, "registered");
        self.index.insert(name, self.entries.len());
        self.entries.push(Entry { spec, template });
        Ok(())
    }

    /// Register every spec in order, stopping at the first error.
    pub fn register_all<I>(&mut self, specs: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = ParameterSpec>,
    {
        specs.into_iter().try_for_each(|spec| self.register(spec))
    }

    /// Register a function.
    pub fn register_function(&mut self, spec: FunctionSpec) -> Result<(), RegistrationError> {
        let name = spec.name.clone();
        if self.is_taken(&name) {
            return Err(RegistrationError::DuplicateName(name));
        }
        let template = CommandTemplate::parse(&spec.template).map_err(|reason| {
            RegistrationError::InvalidTemplate {
                name: name.clone(),
                reason,
            }
        })?;
        let expected: Vec<String> = (0..spec.args.len()).map(|i| i.to_string()).collect();
        let mut keys: Vec<&str> = template.keys().collect();
        keys.sort_by_key(|k| k.parse::<usize>().unwrap_or(usize::MAX));
        if keys != expected {
            return Err(RegistrationError::InvalidTemplate {
                name,
                reason: format!(
                    "{:?} must use sites {:?} for {} argument(s)",
                    spec.template,
                    expected,
                    spec.args.len()
                ),
            });
        }

        self.function_index.insert(name, self.functions.len());
        self.functions.push(FunctionEntry { spec, template });
        Ok(())
    }

    fn is_taken(&self, name: &str) -> bool {
        self.index.contains_key(name) || self.function_index.contains_key(name)
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Open a session over `transport`.
    pub fn session<'a>(&'a self, transport: &'a mut dyn Transport) -> Session<'a> {
        Session {
            registry: self,
            transport,
        }
    }

    /// Read a parameter.
    pub fn get(&self, name: &str, transport: &mut dyn Transport) -> Result<Value, GetError> {
        self.session(transport).get(name)
    }

    /// Write a parameter.
    pub fn set(
        &self,
        name: &str,
        value: impl Into<Value>,
        transport: &mut dyn Transport,
    ) -> Result<(), SetError> {
        self.session(transport).set(name, &value.into())
    }

    /// Invoke a function.
    pub fn call(
        &self,
        name: &str,
        args: &[Value],
        transport: &mut dyn Transport,
    ) -> Result<(), CallError> {
        self.session(transport).call(name, args)
    }

    fn read(&self, session: &mut Session<'_>, name: &str) -> Result<Value, GetError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| GetError::UnknownParameter(name.to_string()))?;
        let spec = &entry.spec;
        let _span = tracing::debug_span!("get", parameter = %name).entered();

        let raw = match &spec.get {
            GetStrategy::None => return Err(GetError::NotReadable(name.to_string())),
            GetStrategy::FixedQuery(cmd) => {
                tracing::debug!(parameter = %name, command = %cmd, "get");
                session.query(cmd)?
            }
            GetStrategy::Custom(f) => {
                tracing::debug!(parameter = %name, "get (custom)");
                f(session)?
            }
        };

        if let Some(mapping) = &spec.mapping {
            return match mapping.from_wire(&raw) {
                Some(value) => Ok(value.clone()),
                None => {
                    tracing::warn!(parameter = %name, response = %raw.trim(), "unmapped response");
                    Err(GetError::UnmappedResponse {
                        name: name.to_string(),
                        response: raw.trim().to_string(),
                    })
                }
            };
        }

        if let Some(parser) = &spec.parser {
            return parser.parse(&raw).map_err(|reason| {
                tracing::warn!(parameter = %name, response = %raw, "parse failed: {}", reason);
                GetError::ParseError {
                    name: name.to_string(),
                    response: raw.clone(),
                    reason,
                }
            });
        }

        Ok(Value::Text(raw))
    }

    fn write(&self, session: &mut Session<'_>, name: &str, value: &Value) -> Result<(), SetError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| SetError::UnknownParameter(name.to_string()))?;
        let spec = &entry.spec;

        if matches!(spec.set, SetStrategy::None) {
            return Err(SetError::NotSettable(name.to_string()));
        }

        let token = if let Some(mapping) = &spec.mapping {
            match mapping.to_wire(value) {
                Some(token) => token.to_string(),
                None => {
                    return Err(reject(
                        name,
                        value,
                        format!("not one of {}", mapping.describe()),
                    ))
                }
            }
        } else {
            if let Some(validator) = &spec.validator {
                validator
                    .validate(value)
                    .map_err(|reason| reject(name, value, reason))?;
            }
            value.to_wire()
        };

        let _span = tracing::debug_span!("set", parameter = %name).entered();
        match (&spec.set, &entry.template) {
            (SetStrategy::Custom(f), _) => {
                tracing::debug!(parameter = %name, token = %token, "set (custom)");
                f(session, value, &token)
            }
            (SetStrategy::Template(_), Some(template)) => {
                let command = template
                    .render_value(&token)
                    .map_err(|e| SetError::Format {
                        name: name.to_string(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(parameter = %name, command = %command, "set");
                session.send(&command)?;
                Ok(())
            }
            _ => Err(SetError::NotSettable(name.to_string())),
        }
    }

    fn invoke(&self, session: &mut Session<'_>, name: &str, args: &[Value]) -> Result<(), CallError> {
        let entry = self
            .function_index
            .get(name)
            .map(|&i| &self.functions[i])
            .ok_or_else(|| CallError::UnknownFunction(name.to_string()))?;

        if args.len() != entry.spec.args.len() {
            return Err(CallError::ArgumentCount {
                name: name.to_string(),
                expected: entry.spec.args.len(),
                got: args.len(),
            });
        }

        let mut tokens = Vec::with_capacity(args.len());
        for (index, (arg, validator)) in args.iter().zip(&entry.spec.args).enumerate() {
            if let Err(reason) = validator.validate(arg) {
                tracing::warn!(function = %name, index, value = %arg, "rejected: {}", reason);
                return Err(CallError::InvalidArgument {
                    name: name.to_string(),
                    index,
                    value: arg.to_string(),
                    reason,
                });
            }
            tokens.push(arg.to_wire());
        }

        let command = entry
            .template
            .render_args(&tokens)
            .map_err(|e| CallError::Format {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(function = %name, command = %command, "call");
        session.send(&command)?;
        Ok(())
    }

    /// Parameter names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.spec.name.as_str())
    }

    /// Function names in registration order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.spec.name.as_str())
    }

    /// Spec registered under `name`.
    pub fn spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.entry(name).map(|e| &e.spec)
    }

    /// Function registered under `name`.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.function_index.get(name).map(|&i| &self.functions[i].spec)
    }

    /// True if a parameter named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no parameters are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Summaries of every parameter, in registration order.
    pub fn describe(&self) -> Vec<ParameterInfo> {
        self.entries
            .iter()
            .map(|Entry { spec, template }| ParameterInfo {
                name: spec.name.clone(),
                label: spec.label_or_name().to_string(),
                unit: spec.unit.clone(),
                readable: spec.is_readable(),
                settable: spec.is_settable(),
                domain: spec.domain(),
                query: match &spec.get {
                    GetStrategy::FixedQuery(q) => Some(q.clone()),
                    _ => None,
                },
                command: template.as_ref().map(|t| t.as_str().to_string()),
            })
            .collect()
    }

    /// Summaries of every function, in registration order.
    pub fn describe_functions(&self) -> Vec<FunctionInfo> {
        self.functions
            .iter()
            .map(|f| FunctionInfo {
                name: f.spec.name.clone(),
                command: f.template.as_str().to_string(),
                args: f.spec.args.iter().map(|v| v.describe()).collect(),
                doc: f.spec.doc.clone(),
            })
            .collect()
    }
}

fn reject(name: &str, value: &Value, reason: String) -> SetError {
    tracing::warn!(parameter = %name, value = %value, "rejected: {}", reason);
    SetError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason,
    }
}

/// A registry bound to an open transport for the duration of one operation.
///
/// Custom getters and setters receive the session, giving them raw
/// `send`/`query` access and the ability to read other parameters.
pub struct Session<'a> {
    registry: &'a ParameterRegistry,
    transport: &'a mut dyn Transport,
}

impl<'a> Session<'a> {
    /// The registry this session interprets.
    pub fn registry(&self) -> &'a ParameterRegistry {
        self.registry
    }

    /// Send a raw command.
    pub fn send(&mut self, command: &str) -> Result<(), TransportError> {
        tracing::debug!("send: {:?}", command);
        self.transport.send(command)
    }

    /// Send a raw query and return the response.
    pub fn query(&mut self, command: &str) -> Result<String, TransportError> {
        tracing::debug!("query: {:?}", command);
        let response = self.transport.query(command)?;
        tracing::debug!("response: {:?}", response);
        Ok(response)
    }

    /// Discard pending input on the transport.
    pub fn clear(&mut self) -> Result<(), TransportError> {
        self.transport.clear()
    }

    /// Read a parameter by name.
    pub fn get(&mut self, name: &str) -> Result<Value, GetError> {
        let registry = self.registry;
        registry.read(self, name)
    }

    /// Read a parameter and return the wire token for its current value.
    ///
    /// Mapped parameters are mapped back (`"dc voltage"` → `"VOLT:DC"`);
    /// others render with [`Value::to_wire`].
    pub fn get_wire(&mut self, name: &str) -> Result<String, GetError> {
        let value = self.get(name)?;
        let mapping = self.registry.spec(name).and_then(|s| s.value_mapping());
        Ok(match mapping.and_then(|m| m.to_wire(&value)) {
            Some(token) => token.to_string(),
            None => value.to_wire(),
        })
    }

    /// Write a parameter by name.
    pub fn set(&mut self, name: &str, value: &Value) -> Result<(), SetError> {
        let registry = self.registry;
        registry.write(self, name, value)
    }

    /// Invoke a function by name.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<(), CallError> {
        let registry = self.registry;
        registry.invoke(self, name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ResponseParser;
    use crate::transport::MockTransport;
    use crate::validator::Validator;
    use tracing_test::traced_test;

    fn voltage() -> ParameterSpec {
        ParameterSpec::new("voltage")
            .get_cmd("VOLT?")
            .set_cmd("VOLT {val}")
            .validator(Validator::numbers(0.0, 32.05))
            .parser(ResponseParser::Float)
    }

    #[test]
    fn test_incomplete_spec_rejected() {
        let mut reg = ParameterRegistry::new();
        let err = reg.register(ParameterSpec::new("nothing")).unwrap_err();
        assert_eq!(err, RegistrationError::IncompleteSpec("nothing".into()));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_conflicting_conversion_rejected() {
        let mut reg = ParameterRegistry::new();
        let spec = ParameterSpec::new("output")
            .get_cmd("OUTP?")
            .val_mapping([("ON", "1"), ("OFF", "0")])
            .parser(ResponseParser::Bool);
        assert_eq!(
            reg.register(spec).unwrap_err(),
            RegistrationError::ConflictingConversion("output".into())
        );
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let mut reg = ParameterRegistry::new();
        let spec = ParameterSpec::new("mode")
            .get_cmd("FUNC?")
            .set_cmd("FUNC {val}")
            .val_mapping(Vec::<(&str, &str)>::new());
        assert_eq!(
            reg.register(spec).unwrap_err(),
            RegistrationError::EmptyMapping("mode".into())
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_parameter_template_only_substitutes_val() {
        let mut reg = ParameterRegistry::new();
        for source in ["APPL {0},{1}", "VOLT {}", "VOLT {value}", "VOLT {val"] {
            assert!(
                matches!(
                    reg.register(ParameterSpec::new("p").set_cmd(source)),
                    Err(RegistrationError::InvalidTemplate { .. })
                ),
                "{}",
                source
            );
        }
        assert!(reg.is_empty());

        reg.register(ParameterSpec::new("p").set_cmd("SOUR:LIST {{{val}}}"))
            .unwrap();
        let mut mock = MockTransport::new();
        reg.set("p", 3, &mut mock).unwrap();
        assert_eq!(mock.sent(), ["SOUR:LIST {3}"]);
    }

    #[test]
    fn test_function_site_count_must_match_args() {
        let mut reg = ParameterRegistry::new();
        let f = crate::function::FunctionSpec::new("apply", "APPL {0},{1}")
            .arg(Validator::numbers(0.0, 1.0));
        assert!(matches!(
            reg.register_function(f),
            Err(RegistrationError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_zero_site_template_sends_verbatim() {
        let mut reg = ParameterRegistry::new();
        reg.register(ParameterSpec::new("reset").set_cmd("*RST")).unwrap();
        let mut mock = MockTransport::new();
        reg.set("reset", "anything", &mut mock).unwrap();
        assert_eq!(mock.sent(), ["*RST"]);
    }

    #[test]
    fn test_pass_through_string() {
        let mut reg = ParameterRegistry::new();
        reg.register(ParameterSpec::new("identity").get_cmd("*IDN?")).unwrap();
        let mut mock = MockTransport::new();
        mock.push_response("HAMEG,HMC8043,1234,1.0");
        assert_eq!(
            reg.get("identity", &mut mock).unwrap(),
            Value::from("HAMEG,HMC8043,1234,1.0")
        );
    }

    #[test]
    fn test_parse_error_carries_raw() {
        let mut reg = ParameterRegistry::new();
        reg.register(voltage()).unwrap();
        let mut mock = MockTransport::new();
        mock.push_response("ERR");
        match reg.get("voltage", &mut mock) {
            Err(GetError::ParseError { name, response, .. }) => {
                assert_eq!(name, "voltage");
                assert_eq!(response, "ERR");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_not_readable_and_not_settable() {
        let mut reg = ParameterRegistry::new();
        reg.register(ParameterSpec::new("reset").set_cmd("*RST")).unwrap();
        reg.register(ParameterSpec::new("identity").get_cmd("*IDN?")).unwrap();
        let mut mock = MockTransport::new();
        assert!(matches!(reg.get("reset", &mut mock), Err(GetError::NotReadable(_))));
        assert!(matches!(
            reg.set("identity", "x", &mut mock),
            Err(SetError::NotSettable(_))
        ));
        assert!(matches!(
            reg.get("missing", &mut mock),
            Err(GetError::UnknownParameter(_))
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_custom_setter_reads_dependency() {
        let mut reg = ParameterRegistry::new();
        reg.register(
            ParameterSpec::new("channel")
                .get_cmd("channel?")
                .parser(ResponseParser::Int),
        )
        .unwrap();
        reg.register(ParameterSpec::new("level").set_with(|s, _value, token| {
            let ch = s.get("channel").map_err(|e| SetError::Dependency {
                name: "level".into(),
                source: Box::new(e),
            })?;
            s.send(&format!("ch{}:level={}", ch, token))?;
            Ok(())
        }))
        .unwrap();

        let mut mock = MockTransport::new();
        mock.push_response("2");
        reg.set("level", 1.5, &mut mock).unwrap();
        assert_eq!(mock.queries(), ["channel?"]);
        assert_eq!(mock.sent(), ["ch2:level=1.5"]);
    }

    #[test]
    fn test_get_wire_maps_back() {
        let mut reg = ParameterRegistry::new();
        reg.register(
            ParameterSpec::new("mode")
                .get_cmd("FUNC?")
                .val_mapping([("dc voltage", "VOLT:DC"), ("ac voltage", "VOLT:AC")]),
        )
        .unwrap();
        let mut mock = MockTransport::new();
        mock.push_response("VOLT:AC");
        let mut session = reg.session(&mut mock);
        assert_eq!(session.get_wire("mode").unwrap(), "VOLT:AC");
    }

    #[test]
    fn test_describe() {
        let mut reg = ParameterRegistry::new();
        reg.register(voltage().label("Voltage").unit("V")).unwrap();
        let info = reg.describe();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].label, "Voltage");
        assert_eq!(info[0].query.as_deref(), Some("VOLT?"));
        assert_eq!(info[0].command.as_deref(), Some("VOLT {val}"));
        assert_eq!(info[0].domain.as_deref(), Some("0..=32.05"));
    }

    #[test]
    #[traced_test]
    fn test_wire_events_carry_parameter_name() {
        let mut reg = ParameterRegistry::new();
        reg.register(voltage()).unwrap();
        let mut mock = MockTransport::with_responses(["15.000"]);
        reg.set("voltage", 5.0, &mut mock).unwrap();
        reg.get("voltage", &mut mock).unwrap();

        assert!(logs_contain("parameter=voltage command=VOLT 5"));
        assert!(logs_contain("parameter=voltage command=VOLT?"));
    }
}

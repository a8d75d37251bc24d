//! ParameterSpec - static descriptor of one instrument quantity
//!
//! A spec bundles how a quantity is read ([`GetStrategy`]), how it is written
//! ([`SetStrategy`]) and how logical values relate to wire tokens (either a
//! [`ValueMapping`], or a [`Validator`] plus [`ResponseParser`], or neither for
//! a bare pass-through string).
//!
//! Specs are built once from a driver's command table and handed to
//! [`ParameterRegistry::register`](crate::registry::ParameterRegistry::register),
//! which checks the invariants and rejects malformed specs.
//!
//! # Example
//!
//! ```rust,ignore
//! use instr_core::prelude::*;
//!
//! let voltage = ParameterSpec::new("voltage")
//!     .label("Voltage")
//!     .unit("V")
//!     .get_cmd("VOLT?")
//!     .set_cmd("VOLT {val}")
//!     .validator(Validator::numbers(0.0, 32.05))
//!     .parser(ResponseParser::Float);
//! ```

use crate::error::{GetError, SetError};
use crate::mapping::ValueMapping;
use crate::parser::ResponseParser;
use crate::registry::Session;
use crate::validator::Validator;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Custom read routine. Returns the logical-layer response string, which is
/// then run through the spec's mapping or parser.
pub type GetFn = Arc<dyn Fn(&mut Session<'_>) -> Result<String, GetError> + Send + Sync>;

/// Custom write routine. Receives the logical value and the wire token the
/// spec's mapping (or [`Value::to_wire`]) produced for it.
pub type SetFn = Arc<dyn Fn(&mut Session<'_>, &Value, &str) -> Result<(), SetError> + Send + Sync>;

/// How a parameter is read.
#[derive(Clone, Default)]
pub enum GetStrategy {
    /// Not readable.
    #[default]
    None,
    /// Issue one fixed query.
    FixedQuery(String),
    /// Run a custom routine against the session.
    Custom(GetFn),
}

/// How a parameter is written.
#[derive(Clone, Default)]
pub enum SetStrategy {
    /// Read-only.
    #[default]
    None,
    /// Format the wire token into a command template with at most one `{val}` site.
    Template(String),
    /// Run a custom routine against the session.
    Custom(SetFn),
}

impl fmt::Debug for GetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetStrategy::None => write!(f, "None"),
            GetStrategy::FixedQuery(cmd) => f.debug_tuple("FixedQuery").field(cmd).finish(),
            GetStrategy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl fmt::Debug for SetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetStrategy::None => write!(f, "None"),
            SetStrategy::Template(t) => f.debug_tuple("Template").field(t).finish(),
            SetStrategy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Descriptor of one controllable or readable instrument quantity.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub(crate) name: String,
    pub(crate) label: Option<String>,
    pub(crate) unit: Option<String>,
    pub(crate) get: GetStrategy,
    pub(crate) set: SetStrategy,
    pub(crate) mapping: Option<ValueMapping>,
    pub(crate) validator: Option<Validator>,
    pub(crate) parser: Option<ResponseParser>,
    pub(crate) empty_mapping: bool,
}

impl ParameterSpec {
    /// Start a spec with no strategies and no conversion.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            unit: None,
            get: GetStrategy::None,
            set: SetStrategy::None,
            mapping: None,
            validator: None,
            parser: None,
            empty_mapping: false,
        }
    }

    /// Human-readable label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Physical unit (`"V"`, `"Hz"`).
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Read with a fixed query.
    pub fn get_cmd(mut self, query: impl Into<String>) -> Self {
        self.get = GetStrategy::FixedQuery(query.into());
        self
    }

    /// Read with a custom routine.
    pub fn get_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Session<'_>) -> Result<String, GetError> + Send + Sync + 'static,
    {
        self.get = GetStrategy::Custom(Arc::new(f));
        self
    }

    /// Write by formatting a command template.
    pub fn set_cmd(mut self, template: impl Into<String>) -> Self {
        self.set = SetStrategy::Template(template.into());
        self
    }

    /// Write with a custom routine.
    pub fn set_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Session<'_>, &Value, &str) -> Result<(), SetError> + Send + Sync + 'static,
    {
        self.set = SetStrategy::Custom(Arc::new(f));
        self
    }

    /// Bidirectional logical/wire mapping.
    pub fn mapping(mut self, mapping: ValueMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Mapping from `(logical, wire)` pairs. An empty table fails
    /// registration with [`RegistrationError::EmptyMapping`].
    ///
    /// [`RegistrationError::EmptyMapping`]: crate::error::RegistrationError::EmptyMapping
    pub fn val_mapping<I, L, W>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, W)>,
        L: Into<Value>,
        W: Into<String>,
    {
        match ValueMapping::new(pairs) {
            Some(mapping) => self.mapping(mapping),
            None => {
                self.empty_mapping = true;
                self
            }
        }
    }

    /// Domain constraint for raw values.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Response conversion for raw values.
    pub fn parser(mut self, parser: ResponseParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable label, defaulting to the name.
    pub fn label_or_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Physical unit, if any.
    pub fn unit_str(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// True if the parameter has a get strategy.
    pub fn is_readable(&self) -> bool {
        !matches!(self.get, GetStrategy::None)
    }

    /// True if the parameter has a set strategy.
    pub fn is_settable(&self) -> bool {
        !matches!(self.set, SetStrategy::None)
    }

    /// Value mapping, if any.
    pub fn value_mapping(&self) -> Option<&ValueMapping> {
        self.mapping.as_ref()
    }

    /// Validator, if any.
    pub fn value_validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Rendering of the accepted logical values, if constrained.
    pub fn domain(&self) -> Option<String> {
        if let Some(mapping) = &self.mapping {
            Some(mapping.describe())
        } else {
            self.validator.as_ref().map(Validator::describe)
        }
    }
}

/// Reusable custom getters.
pub mod getters {
    use super::*;

    /// Query a `1`/`0` state and translate it to `ON`/`OFF`.
    ///
    /// Any other response is passed through unchanged, so an `ON`/`OFF`
    /// mapping on the spec reports it as unmapped.
    pub fn bool_state(
        query: impl Into<String>,
    ) -> impl Fn(&mut Session<'_>) -> Result<String, GetError> + Send + Sync + 'static {
        let query = query.into();
        move |session: &mut Session<'_>| {
            let r = session.query(&query)?;
            Ok(match r.trim() {
                "1" => "ON".to_string(),
                "0" => "OFF".to_string(),
                other => other.to_string(),
            })
        }
    }
}

//! Instrument functions: fire-and-forget commands with validated arguments.

use crate::validator::Validator;

/// Descriptor of a command such as `APPL {0},{1}` or `VOLT UP`.
///
/// The template names one site per declared argument, `{0}` for the first.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub(crate) name: String,
    pub(crate) template: String,
    pub(crate) args: Vec<Validator>,
    pub(crate) doc: Option<String>,
}

impl FunctionSpec {
    /// A function with no arguments.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            args: Vec::new(),
            doc: None,
        }
    }

    /// Append an argument validated by `validator`.
    pub fn arg(mut self, validator: Validator) -> Self {
        self.args.push(validator);
        self
    }

    /// One-line description for listings.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument validators, in order.
    pub fn args(&self) -> &[Validator] {
        &self.args
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

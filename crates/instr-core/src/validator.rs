//! Domain constraints for raw numeric and keyword parameters.
//!
//! A validator is checked before any transport I/O on the write path, so a
//! value outside the declared domain never reaches the instrument.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Constraint on the logical value domain of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// Inclusive numeric range. Accepts integers and finite floats.
    Numbers {
        /// Minimum allowed value (inclusive).
        min: f64,
        /// Maximum allowed value (inclusive).
        max: f64,
    },

    /// Inclusive integer range.
    Ints {
        /// Minimum allowed value (inclusive).
        min: i64,
        /// Maximum allowed value (inclusive).
        max: i64,
    },

    /// Value must match one of the listed values.
    Enum(Vec<Value>),

    /// Value must be a boolean.
    Bool,

    /// Union: value passes if any member validator accepts it.
    MultiType(Vec<Validator>),
}

impl Validator {
    /// Inclusive numeric range.
    pub fn numbers(min: f64, max: f64) -> Self {
        Validator::Numbers { min, max }
    }

    /// Inclusive integer range.
    pub fn ints(min: i64, max: i64) -> Self {
        Validator::Ints { min, max }
    }

    /// Enumerated set of permitted values.
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Validator::Enum(values.into_iter().map(Into::into).collect())
    }

    /// Check a value against the domain, returning a reason on rejection.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::Numbers { min, max } => {
                let x = value
                    .as_f64()
                    .ok_or_else(|| format!("expected a number, got {:?}", value))?;
                if !x.is_finite() {
                    return Err(format!("{} is not a finite number", x));
                }
                if x < *min || x > *max {
                    return Err(format!("outside {}", self.describe()));
                }
                Ok(())
            }

            Validator::Ints { min, max } => {
                let i = match value {
                    Value::Int(i) => *i,
                    other => return Err(format!("expected an integer, got {:?}", other)),
                };
                if i < *min || i > *max {
                    return Err(format!("outside {}", self.describe()));
                }
                Ok(())
            }

            Validator::Enum(choices) => {
                if choices.iter().any(|c| c.matches(value)) {
                    Ok(())
                } else {
                    Err(format!("not one of {}", self.describe()))
                }
            }

            Validator::Bool => match value {
                Value::Bool(_) => Ok(()),
                other => Err(format!("expected a boolean, got {:?}", other)),
            },

            Validator::MultiType(members) => {
                if members.iter().any(|m| m.validate(value).is_ok()) {
                    Ok(())
                } else {
                    Err(format!("matches none of {}", self.describe()))
                }
            }
        }
    }

    /// Human-readable rendering of the domain.
    pub fn describe(&self) -> String {
        match self {
            Validator::Numbers { min, max } => format!("{}..={}", min, max),
            Validator::Ints { min, max } => format!("{}..={} (integer)", min, max),
            Validator::Enum(choices) => {
                let items: Vec<String> = choices.iter().map(ToString::to_string).collect();
                format!("{{{}}}", items.join(", "))
            }
            Validator::Bool => "bool".to_string(),
            Validator::MultiType(members) => {
                let items: Vec<String> = members.iter().map(Validator::describe).collect();
                items.join(" | ")
            }
        }
    }
}

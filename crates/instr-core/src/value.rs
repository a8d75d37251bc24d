//! Logical parameter values.
//!
//! A [`Value`] is what callers pass to `set` and receive from `get`. It is
//! distinct from the wire token actually exchanged with the instrument; the
//! conversion between the two is owned by the parameter's mapping, validator
//! and parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed, user-facing value of an instrument parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean state, sent as `1`/`0`.
    Bool(bool),
    /// Integer quantity (channel index, count, digits).
    Int(i64),
    /// Floating point quantity (voltage, frequency, time).
    Float(f64),
    /// Free text or enumerated keyword (`"ON"`, `"sine"`).
    Text(String),
}

impl Value {
    /// Render the token substituted into a command template.
    pub fn to_wire(&self) -> String {
        match self {
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value. Floats with no fractional part qualify.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Logical equality used by mappings and enumerated validators.
    ///
    /// Integers and floats compare numerically; everything else compares
    /// by variant and content.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }

    /// Convert free-form input (command line, scripts) into a value.
    ///
    /// Tries integer, then float, then `true`/`false`; anything else is text.
    /// Words such as `inf` stay text so they can match enumerated keywords.
    pub fn infer(input: &str) -> Value {
        let trimmed = input.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        if trimmed.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return Value::Float(f);
            }
        }
        match trimmed {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Text(input.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_rendering() {
        assert_eq!(Value::Float(32.05).to_wire(), "32.05");
        assert_eq!(Value::Float(15.0).to_wire(), "15");
        assert_eq!(Value::Int(3).to_wire(), "3");
        assert_eq!(Value::Bool(true).to_wire(), "1");
        assert_eq!(Value::Bool(false).to_wire(), "0");
        assert_eq!(Value::from("SIN").to_wire(), "SIN");
    }

    #[test]
    fn test_numeric_matching_crosses_variants() {
        assert!(Value::Int(1).matches(&Value::Float(1.0)));
        assert!(!Value::Int(1).matches(&Value::Float(1.5)));
        assert!(!Value::Int(1).matches(&Value::from("1")));
        assert!(Value::from("ON").matches(&Value::from("ON")));
    }

    #[test]
    fn test_infer() {
        assert_eq!(Value::infer("12"), Value::Int(12));
        assert_eq!(Value::infer("32.05"), Value::Float(32.05));
        assert_eq!(Value::infer("1e-3"), Value::Float(1e-3));
        assert_eq!(Value::infer("true"), Value::Bool(true));
        assert_eq!(Value::infer("ON"), Value::from("ON"));
        assert_eq!(Value::infer("inf"), Value::from("inf"));
    }

    #[test]
    fn test_integral_float_as_i64() {
        assert_eq!(Value::Float(2.0).as_i64(), Some(2));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::from("2").as_i64(), None);
    }
}

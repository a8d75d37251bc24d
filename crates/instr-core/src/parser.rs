//! Response parsers for raw (unmapped) parameters.

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Function converting a raw response to a logical value.
pub type ParseFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Converts the raw response string of a query into a typed [`Value`].
#[derive(Clone)]
pub enum ResponseParser {
    /// Parse as `f64` (`"15.000"`, `"+1.234E-03"`).
    Float,
    /// Parse as `i64`. Integral floats such as `"2.0"` are accepted.
    Int,
    /// `1/0/ON/OFF/TRUE/FALSE`, case-insensitive.
    Bool,
    /// Trimmed text with one pair of surrounding quotes removed.
    Text,
    /// Instrument-specific conversion.
    Custom(ParseFn),
}

impl ResponseParser {
    /// Wrap a closure as a custom parser.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        ResponseParser::Custom(Arc::new(f))
    }

    /// Apply the parser to a raw response.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let s = raw.trim();
        match self {
            ResponseParser::Float => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("not a number: {}", e)),
            ResponseParser::Int => {
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                match s.parse::<f64>() {
                    Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Value::Int(f as i64)),
                    _ => Err("not an integer".to_string()),
                }
            }
            ResponseParser::Bool => match s.to_ascii_uppercase().as_str() {
                "1" | "ON" | "TRUE" => Ok(Value::Bool(true)),
                "0" | "OFF" | "FALSE" => Ok(Value::Bool(false)),
                _ => Err("not a boolean".to_string()),
            },
            ResponseParser::Text => Ok(Value::Text(strip_quotes(s).to_string())),
            ResponseParser::Custom(f) => f(raw),
        }
    }
}

impl fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseParser::Float => write!(f, "Float"),
            ResponseParser::Int => write!(f, "Int"),
            ResponseParser::Bool => write!(f, "Bool"),
            ResponseParser::Text => write!(f, "Text"),
            ResponseParser::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Remove one pair of matching single or double quotes.
pub fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float() {
        assert_eq!(ResponseParser::Float.parse("15.000").unwrap(), Value::Float(15.0));
        assert_eq!(
            ResponseParser::Float.parse("+1.234E-03\r\n").unwrap(),
            Value::Float(1.234e-3)
        );
        assert!(ResponseParser::Float.parse("OVLD").is_err());
    }

    #[test]
    fn test_int_accepts_integral_float() {
        assert_eq!(ResponseParser::Int.parse("3").unwrap(), Value::Int(3));
        assert_eq!(ResponseParser::Int.parse("+2.000000E+00").unwrap(), Value::Int(2));
        assert!(ResponseParser::Int.parse("2.5").is_err());
    }

    #[test]
    fn test_bool() {
        assert_eq!(ResponseParser::Bool.parse("1").unwrap(), Value::Bool(true));
        assert_eq!(ResponseParser::Bool.parse("off").unwrap(), Value::Bool(false));
        assert!(ResponseParser::Bool.parse("maybe").is_err());
    }

    #[test]
    fn test_text_strips_quotes() {
        assert_eq!(
            ResponseParser::Text.parse("\"VOLT:DC\"").unwrap(),
            Value::from("VOLT:DC")
        );
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn test_custom() {
        let p = ResponseParser::custom(|s| Ok(Value::from(s.trim().to_lowercase())));
        assert_eq!(p.parse("MOV").unwrap(), Value::from("mov"));
    }
}

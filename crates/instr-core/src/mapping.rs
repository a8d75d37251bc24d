//! Bidirectional mapping between logical values and wire tokens.

use crate::value::Value;

/// Ordered set of `(logical value, wire token)` pairs.
///
/// Lookups are linear; instrument keyword tables are a handful of entries.
/// When several logical values share a wire token, the first pair wins on
/// the read path.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMapping {
    pairs: Vec<(Value, String)>,
}

impl ValueMapping {
    /// Build a mapping from `(logical, wire)` pairs.
    ///
    /// Returns `None` for an empty table.
    pub fn new<I, L, W>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (L, W)>,
        L: Into<Value>,
        W: Into<String>,
    {
        let pairs: Vec<(Value, String)> = pairs
            .into_iter()
            .map(|(l, w)| (l.into(), w.into()))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(Self { pairs })
        }
    }

    /// `{"ON": "ON", "OFF": "OFF"}`, the common SCPI state keyword mapping.
    pub fn on_off() -> Self {
        Self {
            pairs: vec![
                (Value::from("ON"), "ON".to_string()),
                (Value::from("OFF"), "OFF".to_string()),
            ],
        }
    }

    /// Wire token for a logical value.
    pub fn to_wire(&self, value: &Value) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(logical, _)| logical.matches(value))
            .map(|(_, wire)| wire.as_str())
    }

    /// Logical value for a (trimmed) wire response.
    pub fn from_wire(&self, response: &str) -> Option<&Value> {
        let token = response.trim();
        self.pairs
            .iter()
            .find(|(_, wire)| wire == token)
            .map(|(logical, _)| logical)
    }

    /// Accepted logical values, in declaration order.
    pub fn logical_values(&self) -> impl Iterator<Item = &Value> {
        self.pairs.iter().map(|(logical, _)| logical)
    }

    /// Known wire tokens, in declaration order.
    pub fn wire_tokens(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, wire)| wire.as_str())
    }

    /// Human-readable rendering of the accepted logical values.
    pub fn describe(&self) -> String {
        let items: Vec<String> = self.logical_values().map(ToString::to_string).collect();
        format!("{{{}}}", items.join(", "))
    }
}

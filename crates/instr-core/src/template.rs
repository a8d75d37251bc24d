//! Command templates with named substitution sites, formatted by `strfmt`.
//!
//! Parameter setters use the `{val}` site (`"VOLT {val}"`). Functions name
//! their sites by argument position (`"APPL {0},{1}"`). `{{` and `}}` produce
//! literal braces.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use strfmt::{strfmt, strfmt_map, FmtError, Formatter};

/// Site a parameter's wire token is substituted into.
pub const VALUE_KEY: &str = "val";

/// Checked command format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    keys: BTreeSet<String>,
}

impl CommandTemplate {
    /// Parse a format string and check that it renders.
    pub fn parse(source: &str) -> Result<Self, String> {
        if source.trim().is_empty() {
            return Err("empty command template".to_string());
        }

        let keys = RefCell::new(BTreeSet::new());
        strfmt_map(source, |fmt: Formatter| {
            if fmt.key.is_empty() {
                return Err(FmtError::Invalid("unnamed substitution site".to_string()));
            }
            keys.borrow_mut().insert(fmt.key.to_string());
            Ok(())
        })
        .map_err(|e| format!("{:?}: {}", source, e))?;

        let template = Self {
            source: source.to_string(),
            keys: keys.into_inner(),
        };
        let placeholder: HashMap<String, String> = template
            .keys
            .iter()
            .map(|k| (k.clone(), "0".to_string()))
            .collect();
        template
            .render(&placeholder)
            .map_err(|e| format!("{:?}: {}", source, e))?;
        Ok(template)
    }

    /// Names of the substitution sites, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// True if the template has no substitution site.
    pub fn is_verbatim(&self) -> bool {
        self.keys.is_empty()
    }

    /// The original format string.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Format with `vars`. Variables the template does not name are ignored.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String, FmtError> {
        strfmt(&self.source, vars)
    }

    /// Format a parameter's wire token into the `{val}` site.
    pub fn render_value(&self, token: &str) -> Result<String, FmtError> {
        let mut vars = HashMap::new();
        vars.insert(VALUE_KEY.to_string(), token.to_string());
        self.render(&vars)
    }

    /// Format function arguments into the `{0}`, `{1}`, ... sites.
    pub fn render_args<S: AsRef<str>>(&self, tokens: &[S]) -> Result<String, FmtError> {
        let vars: HashMap<String, String> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (i.to_string(), t.as_ref().to_string()))
            .collect();
        self.render(&vars)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

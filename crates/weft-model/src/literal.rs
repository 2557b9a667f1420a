//! Literal values and their source representation
//!
//! Default parameter values and constant values are rendered back into
//! literal source text (`NULL`, `true`, `'text'`, `array(...)`).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Key of an array literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl Display for ArrayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(key) => write!(f, "{key}"),
            Self::String(key) => f.write_str(&quote_single(key)),
        }
    }
}

/// A literal value as found in parameter defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<(ArrayKey, LiteralValue)>),
}

impl LiteralValue {
    /// Build a list-style array with sequential integer keys
    #[must_use]
    pub fn list(values: impl IntoIterator<Item = LiteralValue>) -> Self {
        Self::Array(
            values
                .into_iter()
                .enumerate()
                .map(|(index, value)| (ArrayKey::Int(index as i64), value))
                .collect(),
        )
    }

    /// Render as source literal
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => float_literal(*value),
            Self::String(value) => quote_single(value),
            Self::Array(entries) => {
                let items: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{key} => {}", value.render()))
                    .collect();
                format!("array({})", items.join(", "))
            }
        }
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Float as source literal
///
/// Whole numbers keep a `.0` so they stay floats; non-finite values map to
/// the `NAN` and `INF` constants.
pub(crate) fn float_literal(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Quote text as single-quoted string literal
#[must_use]
pub fn quote_single(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

//! Dynamic object model
//!
//! Field values of a proxied object as seen by the serialization hooks.
//! Containers can be addressed by dotted paths: list and collection
//! elements by index, map entries by key. A `.` or `\` inside a map key is
//! escaped with `\`, see [`escape_segment`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reference to a live object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub class_name: String,
    /// Identity of the instance within the object graph
    pub handle: u64,
}

impl ObjectRef {
    #[must_use]
    pub fn new(class_name: impl Into<String>, handle: u64) -> Self {
        Self {
            class_name: class_name.into().trim_start_matches('\\').to_string(),
            handle,
        }
    }
}

/// Field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Unordered collection of objects
    Collection(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(ObjectRef),
}

impl Value {
    /// Whether elements can be addressed inside this value
    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Collection(_) | Self::Map(_))
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Elements with their escaped path segment
    #[must_use]
    pub fn entries(&self) -> Vec<(String, &Value)> {
        match self {
            Self::List(values) | Self::Collection(values) => values
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            Self::Map(entries) => entries
                .iter()
                .map(|(key, value)| (escape_segment(key), value))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Value at a dotted path, the empty path being the value itself
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        let (head, rest) = split_path(path);
        let child = match self {
            Self::List(values) | Self::Collection(values) => {
                values.get(head.parse::<usize>().ok()?)?
            }
            Self::Map(entries) => entries.get(head.as_str())?,
            _ => return None,
        };
        child.get_path(rest)
    }

    /// Replace the value at a dotted path; returns false if the path does
    /// not exist
    pub fn set_path(&mut self, path: &str, replacement: Value) -> bool {
        if path.is_empty() {
            *self = replacement;
            return true;
        }
        let (head, rest) = split_path(path);
        let child = match self {
            Self::List(values) | Self::Collection(values) => {
                match head.parse::<usize>().ok().and_then(|index| values.get_mut(index)) {
                    Some(child) => child,
                    None => return false,
                }
            }
            Self::Map(entries) => match entries.get_mut(head.as_str()) {
                Some(child) => child,
                None => return false,
            },
            _ => return false,
        };
        child.set_path(rest, replacement)
    }
}

/// Path segment for a map key, with `.` and `\` escaped
#[must_use]
pub fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '.' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// First segment, unescaped, and the remaining path
fn split_path(path: &str) -> (String, &str) {
    let mut head = String::new();
    let mut chars = path.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    head.push(escaped);
                }
            }
            '.' => return (head, &path[index + 1..]),
            _ => head.push(c),
        }
    }
    (head, "")
}

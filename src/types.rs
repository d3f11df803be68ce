//! Value kinds and the tagged value carried through the registry.

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::{Result, SaveError};

/// The closed set of value kinds the store keeps apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    String,
    Int,
    Float,
    Bool,
    StringArray,
    IntArray,
    FloatArray,
    BoolArray,
}

impl ValueKind {
    pub const ALL: [ValueKind; 8] = [
        ValueKind::String,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Bool,
        ValueKind::StringArray,
        ValueKind::IntArray,
        ValueKind::FloatArray,
        ValueKind::BoolArray,
    ];

    /// Return the canonical string atom for this kind.
    pub fn as_atom(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::StringArray => "string[]",
            ValueKind::IntArray => "int[]",
            ValueKind::FloatArray => "float[]",
            ValueKind::BoolArray => "bool[]",
        }
    }

    /// Parse a canonical atom into a `ValueKind`.
    pub fn from_atom(atom: &str) -> Result<ValueKind> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_atom() == atom)
            .ok_or_else(|| SaveError::UnknownKind(atom.to_string()))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_atom())
    }
}

impl FromStr for ValueKind {
    type Err = SaveError;

    fn from_str(s: &str) -> Result<Self> {
        ValueKind::from_atom(s)
    }
}

/// A value of one of the eight supported kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum PersistentValue {
    String(String),
    Int(i32),
    Float(f32),
    Bool(bool),
    StringArray(Vec<String>),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    BoolArray(Vec<bool>),
}

impl PersistentValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PersistentValue::String(_) => ValueKind::String,
            PersistentValue::Int(_) => ValueKind::Int,
            PersistentValue::Float(_) => ValueKind::Float,
            PersistentValue::Bool(_) => ValueKind::Bool,
            PersistentValue::StringArray(_) => ValueKind::StringArray,
            PersistentValue::IntArray(_) => ValueKind::IntArray,
            PersistentValue::FloatArray(_) => ValueKind::FloatArray,
            PersistentValue::BoolArray(_) => ValueKind::BoolArray,
        }
    }

    /// False for values JSON cannot carry back losslessly (NaN and infinities).
    pub fn is_representable(&self) -> bool {
        match self {
            PersistentValue::Float(x) => x.is_finite(),
            PersistentValue::FloatArray(xs) => xs.iter().all(|x| x.is_finite()),
            _ => true,
        }
    }

    /// Infer the kind of an untyped JSON value.
    ///
    /// Returns `None` when the value fits none of the eight kinds: null,
    /// objects, nested or mixed arrays, integers outside `i32`, and empty
    /// arrays whose element kind cannot be told.
    pub fn from_json(value: &JsonValue) -> Option<PersistentValue> {
        match value {
            JsonValue::String(s) => Some(PersistentValue::String(s.clone())),
            JsonValue::Bool(b) => Some(PersistentValue::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).ok().map(PersistentValue::Int)
                } else if n.is_u64() {
                    None
                } else {
                    n.as_f64().map(|x| PersistentValue::Float(x as f32))
                }
            }
            JsonValue::Array(items) => array_from_json(items),
            JsonValue::Null | JsonValue::Object(_) => None,
        }
    }

    /// Parse a literal of an explicit kind. Scalars are plain text, arrays are
    /// JSON arrays.
    pub fn parse(kind: ValueKind, text: &str) -> Result<PersistentValue> {
        let invalid = || SaveError::InvalidLiteral {
            kind,
            text: text.to_string(),
        };
        let value = match kind {
            ValueKind::String => PersistentValue::String(text.to_string()),
            ValueKind::Int => PersistentValue::Int(text.trim().parse().map_err(|_| invalid())?),
            ValueKind::Float => {
                PersistentValue::Float(text.trim().parse().map_err(|_| invalid())?)
            }
            ValueKind::Bool => PersistentValue::Bool(text.trim().parse().map_err(|_| invalid())?),
            ValueKind::StringArray => {
                PersistentValue::StringArray(serde_json::from_str(text).map_err(|_| invalid())?)
            }
            ValueKind::IntArray => {
                PersistentValue::IntArray(serde_json::from_str(text).map_err(|_| invalid())?)
            }
            ValueKind::FloatArray => {
                PersistentValue::FloatArray(serde_json::from_str(text).map_err(|_| invalid())?)
            }
            ValueKind::BoolArray => {
                PersistentValue::BoolArray(serde_json::from_str(text).map_err(|_| invalid())?)
            }
        };
        Ok(value)
    }
}

fn array_from_json(items: &[JsonValue]) -> Option<PersistentValue> {
    let first = items.first()?;
    match first {
        JsonValue::String(_) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(PersistentValue::StringArray),
        JsonValue::Bool(_) => items
            .iter()
            .map(JsonValue::as_bool)
            .collect::<Option<Vec<_>>>()
            .map(PersistentValue::BoolArray),
        JsonValue::Number(_) => {
            // Integers outside i32 are rejected here as they are for scalars.
            let out_of_range = items.iter().any(|item| match item {
                JsonValue::Number(n) if n.is_i64() || n.is_u64() => {
                    n.as_i64().and_then(|i| i32::try_from(i).ok()).is_none()
                }
                _ => false,
            });
            if out_of_range {
                return None;
            }
            let ints = items
                .iter()
                .map(|item| item.as_i64().and_then(|i| i32::try_from(i).ok()))
                .collect::<Option<Vec<_>>>();
            if let Some(ints) = ints {
                return Some(PersistentValue::IntArray(ints));
            }
            items
                .iter()
                .map(|item| item.as_f64().map(|x| x as f32))
                .collect::<Option<Vec<_>>>()
                .map(PersistentValue::FloatArray)
        }
        _ => None,
    }
}

impl fmt::Display for PersistentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistentValue::String(s) => f.write_str(s),
            PersistentValue::Int(n) => write!(f, "{n}"),
            PersistentValue::Float(x) => write!(f, "{x}"),
            PersistentValue::Bool(b) => write!(f, "{b}"),
            PersistentValue::StringArray(items) => write_json(f, items),
            PersistentValue::IntArray(items) => write_json(f, items),
            PersistentValue::FloatArray(items) => write_json(f, items),
            PersistentValue::BoolArray(items) => write_json(f, items),
        }
    }
}

fn write_json<T: serde::Serialize>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    let text = serde_json::to_string(items).map_err(|_| fmt::Error)?;
    f.write_str(&text)
}

impl From<String> for PersistentValue {
    fn from(value: String) -> Self {
        PersistentValue::String(value)
    }
}

impl From<&str> for PersistentValue {
    fn from(value: &str) -> Self {
        PersistentValue::String(value.to_string())
    }
}

impl From<i32> for PersistentValue {
    fn from(value: i32) -> Self {
        PersistentValue::Int(value)
    }
}

impl From<f32> for PersistentValue {
    fn from(value: f32) -> Self {
        PersistentValue::Float(value)
    }
}

impl From<bool> for PersistentValue {
    fn from(value: bool) -> Self {
        PersistentValue::Bool(value)
    }
}

impl From<Vec<String>> for PersistentValue {
    fn from(value: Vec<String>) -> Self {
        PersistentValue::StringArray(value)
    }
}

impl From<Vec<i32>> for PersistentValue {
    fn from(value: Vec<i32>) -> Self {
        PersistentValue::IntArray(value)
    }
}

impl From<Vec<f32>> for PersistentValue {
    fn from(value: Vec<f32>) -> Self {
        PersistentValue::FloatArray(value)
    }
}

impl From<Vec<bool>> for PersistentValue {
    fn from(value: Vec<bool>) -> Self {
        PersistentValue::BoolArray(value)
    }
}

//! Value kind predicates used to select session entries

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Predicate over the shape of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Every value
    Any,
    /// Labeled arrays (the array-capable kind)
    Array,
    /// Standalone axes
    Axis,
    /// Bool, Int or Float
    Scalar,
    /// Booleans
    Bool,
    /// Integers
    Int,
    /// Floats
    Float,
    /// Strings
    String,
    /// Objects
    Object,
    /// Opaque Rust values
    Opaque,
    /// Null
    Null,
}

impl ValueKind {
    /// True if `value` is of this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Array => matches!(value, Value::Array(_)),
            ValueKind::Axis => matches!(value, Value::Axis(_)),
            ValueKind::Scalar => matches!(value, Value::Bool(_) | Value::Int(_) | Value::Float(_)),
            ValueKind::Bool => matches!(value, Value::Bool(_)),
            ValueKind::Int => matches!(value, Value::Int(_)),
            ValueKind::Float => matches!(value, Value::Float(_)),
            ValueKind::String => matches!(value, Value::String(_)),
            ValueKind::Object => matches!(value, Value::Object(_)),
            ValueKind::Opaque => matches!(value, Value::Opaque(_)),
            ValueKind::Null => matches!(value, Value::Null),
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Array => "array",
            ValueKind::Axis => "axis",
            ValueKind::Scalar => "scalar",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Object => "object",
            ValueKind::Opaque => "opaque",
            ValueKind::Null => "null",
        }
    }
}

impl Default for ValueKind {
    fn default() -> Self {
        ValueKind::Array
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "any" => ValueKind::Any,
            "array" => ValueKind::Array,
            "axis" => ValueKind::Axis,
            "scalar" => ValueKind::Scalar,
            "bool" => ValueKind::Bool,
            "int" => ValueKind::Int,
            "float" => ValueKind::Float,
            "string" | "str" => ValueKind::String,
            "object" => ValueKind::Object,
            "opaque" => ValueKind::Opaque,
            "null" => ValueKind::Null,
            other => {
                return Err(crate::Error::invalid_input(format!(
                    "unknown value kind '{}'",
                    other
                )))
            }
        };
        Ok(kind)
    }
}

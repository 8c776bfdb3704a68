//! Variable values and their semantic kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarKind {
    Int,
    Float,
    Bool,
    Text,
    /// Integer member value of the variable's enum.
    Enum,
    /// Unsigned hardware register field of a fixed bit width.
    RegField { bit_width: u8 },
}

impl VarKind {
    /// Bit width for register fields, `None` for every other kind.
    pub fn bit_width(&self) -> Option<u8> {
        match self {
            VarKind::RegField { bit_width } => Some(*bit_width),
            _ => None,
        }
    }

    /// Neutral placeholder used when a probe run reads an unset variable.
    pub fn placeholder(&self, shape: Shape) -> Value {
        match (self, shape) {
            (VarKind::Float, Shape::Scalar) => Value::Float(1.0),
            (VarKind::Float, Shape::Array) => Value::FloatArray(Vec::new()),
            (VarKind::Bool, _) => Value::Bool(false),
            (VarKind::Text, _) => Value::Text(String::new()),
            (VarKind::Enum, _) => Value::Int(0),
            (_, Shape::Array) => Value::IntArray(Vec::new()),
            (_, Shape::Scalar) => Value::Int(1),
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKind::Int => write!(f, "int"),
            VarKind::Float => write!(f, "float"),
            VarKind::Bool => write!(f, "bool"),
            VarKind::Text => write!(f, "text"),
            VarKind::Enum => write!(f, "enum"),
            VarKind::RegField { bit_width } => write!(f, "field[{bit_width}]"),
        }
    }
}

/// Display representation used by exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarFormat {
    #[default]
    Decimal,
    Hex,
}

/// Scalar or array storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    #[default]
    Scalar,
    Array,
}

/// A concrete variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl Value {
    /// Short type name used in mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::IntArray(_) => "int[]",
            Value::FloatArray(_) => "float[]",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            Value::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float_array(&self) -> Option<&[f64]> {
        match self {
            Value::FloatArray(v) => Some(v),
            _ => None,
        }
    }

    /// Convert `self` into the storage form required by `kind`/`shape`.
    ///
    /// Returns `None` when the value cannot represent that kind. Integers are
    /// accepted for floats and booleans; floats are never truncated to ints.
    pub fn coerce(self, kind: VarKind, shape: Shape) -> Option<Value> {
        match (kind, shape, self) {
            (VarKind::Int | VarKind::Enum, Shape::Scalar, v @ Value::Int(_)) => Some(v),
            (VarKind::RegField { .. }, Shape::Scalar, v @ Value::Int(_)) => Some(v),
            (VarKind::RegField { .. }, Shape::Scalar, Value::Bool(b)) => Some(Value::Int(i64::from(b))),
            (VarKind::Float, Shape::Scalar, v @ Value::Float(_)) => Some(v),
            (VarKind::Float, Shape::Scalar, Value::Int(i)) => Some(Value::Float(i as f64)),
            (VarKind::Bool, Shape::Scalar, v @ Value::Bool(_)) => Some(v),
            (VarKind::Bool, Shape::Scalar, Value::Int(i)) if i == 0 || i == 1 => {
                Some(Value::Bool(i == 1))
            }
            (VarKind::Text, Shape::Scalar, v @ Value::Text(_)) => Some(v),
            (VarKind::Int | VarKind::Enum | VarKind::RegField { .. }, Shape::Array, v @ Value::IntArray(_)) => {
                Some(v)
            }
            (VarKind::Float, Shape::Array, v @ Value::FloatArray(_)) => Some(v),
            (VarKind::Float, Shape::Array, Value::IntArray(items)) => Some(Value::FloatArray(
                items.into_iter().map(|i| i as f64).collect(),
            )),
            _ => None,
        }
    }

    /// Render with the given format; hex only affects integers.
    pub fn render(&self, format: VarFormat) -> String {
        match (self, format) {
            (Value::Int(v), VarFormat::Hex) if *v >= 0 => format!("0x{v:X}"),
            (Value::IntArray(items), VarFormat::Hex) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| if *v >= 0 { format!("0x{v:X}") } else { v.to_string() })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::IntArray(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::FloatArray(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntArray(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatArray(v)
    }
}

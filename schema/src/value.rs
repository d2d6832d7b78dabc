// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Scalar leaf values

use std::fmt::Display;

/// Reserved leaf value asking the device to reset a property to unset. The wire protocol has no
/// null, so this literal travels as a string and is never a value in its own right.
pub const UNSET_MARKER: &str = "DME_UNSET_PROPERTY_MARKER";

/// The value of a leaf, as exposed by [`crate::Node::children`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Bytes(Vec<u8>),
    Float(f32),
    Double(f64),
    /// An enumeration, by its schema name
    Enum(String),
    LeafList(Vec<Value>),
    Decimal { digits: i64, precision: u32 },
    /// Opaque `anydata` content
    Any(Vec<u8>),
}

impl Value {
    #[must_use]
    pub fn is_unset_marker(&self) -> bool {
        matches!(self, Value::String(s) | Value::Enum(s) if s == UNSET_MARKER)
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Enum(_) => "enum",
            Value::LeafList(_) => "leaf-list",
            Value::Decimal { .. } => "decimal64",
            Value::Any(_) => "any",
        }
    }

    /// The textual form used in list keys and path predicates.
    #[must_use]
    pub fn to_key_string(&self) -> String {
        match self {
            Value::String(s) | Value::Enum(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) | Value::Enum(s) => write!(f, "{s}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Bytes(b) | Value::Any(b) => write!(f, "<{} bytes>", b.len()),
            Value::LeafList(items) => {
                write!(f, "[")?;
                for (n, item) in items.iter().enumerate() {
                    if n > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Decimal { digits, precision } => write!(f, "{digits}e-{precision}"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

macro_rules! int_value {
    ($variant:ident, $wide:ty, $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$wide>::from(v))
                }
            }
        )+
    };
}
int_value!(Int, i64, i8, i16, i32, i64);
int_value!(Uint, u64, u8, u16, u32, u64);

#[cfg(test)]
mod tests {
    use super::{UNSET_MARKER, Value};

    #[test]
    fn unset_marker() {
        assert!(Value::from(UNSET_MARKER).is_unset_marker());
        assert!(Value::Enum(UNSET_MARKER.to_string()).is_unset_marker());
        assert!(!Value::from("enabled").is_unset_marker());
    }

    #[test]
    fn key_strings() {
        assert_eq!(Value::from(42u16).to_key_string(), "42");
        assert_eq!(Value::from(-1i8), Value::Int(-1));
        assert_eq!(Value::from("eth1/1").to_key_string(), "eth1/1");
        assert_eq!(Value::from(true).to_key_string(), "true");
        assert_eq!(
            Value::LeafList(vec![1u8.into(), 2u8.into()]).to_string(),
            "[1,2]"
        );
    }
}

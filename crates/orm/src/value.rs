//! Attribute values
//!
//! Tagged values stored in entity attributes and storage items, mirroring the
//! scalar types a DynamoDB item can carry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Raw attribute map exchanged with a storage backend
pub type Item = HashMap<String, AttributeValue>;

/// Attribute value enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttributeValue {
    Null,
    Bool(bool),
    String(String),
    Number(serde_json::Number),
    Binary(Vec<u8>),
}

impl AttributeValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Borrow the inner string if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as one segment of a composite key.
    ///
    /// Null and empty strings have no segment form.
    pub fn to_key_segment(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::String(s) if s.is_empty() => None,
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Number(n) => Some(n.to_string()),
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Binary(bytes) => Some(hex::encode(bytes)),
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Null => JsonValue::Null,
            AttributeValue::Bool(b) => JsonValue::Bool(*b),
            AttributeValue::String(s) => JsonValue::String(s.clone()),
            AttributeValue::Number(n) => JsonValue::Number(n.clone()),
            AttributeValue::Binary(b) => JsonValue::String(hex::encode(b)),
        }
    }

    /// Create an AttributeValue from a JSON value.
    ///
    /// Arrays and objects are stored as their JSON text.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => AttributeValue::Null,
            JsonValue::Bool(b) => AttributeValue::Bool(b),
            JsonValue::Number(n) => AttributeValue::Number(n),
            JsonValue::String(s) => AttributeValue::String(s),
            other @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                AttributeValue::String(other.to_string())
            }
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Binary(b) => write!(f, "{}", hex::encode(b)),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value.into())
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Number(value.into())
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Number(value.into())
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::Binary(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

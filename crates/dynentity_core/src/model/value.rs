//! Scalar values stored in entity attributes.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One attribute value.
///
/// `Null` doubles as the "absent" marker: field sets carrying `Null` for an
/// attribute leave that attribute unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    /// Stored as `0`/`1`; SQLite reads it back as `Integer`.
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Short type label for diagnostics; never includes the value itself.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Converts one JSON value, e.g. a field of an external API payload.
///
/// Integral numbers become `Integer`, other numbers `Real`. Arrays and objects
/// have no scalar form and are kept as their compact JSON text.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(v),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(v) => Self::Integer(v),
                None => number.as_f64().map_or(Self::Null, Self::Real),
            },
            serde_json::Value::String(v) => Self::Text(v),
            compound @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Text(compound.to_string())
            }
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Self::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Self::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Self::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Self::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v.as_slice())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use serde_json::json;

    #[test]
    fn json_numbers_split_into_integer_and_real() {
        assert_eq!(Value::from(json!(30)), Value::Integer(30));
        assert_eq!(Value::from(json!(1.5)), Value::Real(1.5));
    }

    #[test]
    fn json_compound_values_are_kept_as_text() {
        let value = Value::from(json!({"city": "Oslo"}));
        assert_eq!(value.as_text(), Some(r#"{"city":"Oslo"}"#));
        assert_eq!(Value::from(json!([1, 2])).as_text(), Some("[1,2]"));
    }

    #[test]
    fn json_null_maps_to_null_marker() {
        assert!(Value::from(serde_json::Value::Null).is_null());
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn kind_labels_do_not_leak_content() {
        assert_eq!(Value::from("secret").kind(), "text");
        assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "<3 bytes>");
    }
}

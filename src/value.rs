//! Default values attached to record fields

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{Result, SchemaError};

/// A field default value
///
/// Mirrors JSON, plus raw bytes (Avro writes those as a string with one
/// character per byte).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DefaultValue {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<DefaultValue>),
    Object(BTreeMap<String, DefaultValue>),
}

impl DefaultValue {
    /// Parse annotation-style default text as JSON
    pub fn parse(text: &str, target: &str) -> Result<Self> {
        serde_json::from_str::<Value>(text)
            .map(Self::from)
            .map_err(|e| SchemaError::DefaultValueParse {
                target: target.to_string(),
                message: e.to_string(),
            })
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, DefaultValue::Number(n) if !n.is_f64())
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, DefaultValue::Number(n) if n.is_f64())
    }

    /// The Avro JSON encoding of this default
    pub fn to_json(&self) -> Value {
        match self {
            DefaultValue::Null => Value::Null,
            DefaultValue::Boolean(b) => Value::Bool(*b),
            DefaultValue::Number(n) => Value::Number(n.clone()),
            DefaultValue::String(s) => Value::String(s.clone()),
            DefaultValue::Bytes(bytes) => Value::String(bytes.iter().map(|&b| b as char).collect()),
            DefaultValue::Array(items) => Value::Array(items.iter().map(DefaultValue::to_json).collect()),
            DefaultValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DefaultValue::Null,
            Value::Bool(b) => DefaultValue::Boolean(b),
            Value::Number(n) => DefaultValue::Number(n),
            Value::String(s) => DefaultValue::String(s),
            Value::Array(items) => DefaultValue::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => {
                DefaultValue::Object(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<DefaultValue> for Value {
    fn from(value: DefaultValue) -> Self {
        value.to_json()
    }
}

impl From<bool> for DefaultValue {
    fn from(b: bool) -> Self {
        DefaultValue::Boolean(b)
    }
}

impl From<i64> for DefaultValue {
    fn from(n: i64) -> Self {
        DefaultValue::Number(n.into())
    }
}

/// NaN and the infinities have no JSON form
impl TryFrom<f64> for DefaultValue {
    type Error = SchemaError;

    fn try_from(n: f64) -> Result<Self> {
        Number::from_f64(n)
            .map(DefaultValue::Number)
            .ok_or_else(|| SchemaError::DefaultValueParse {
                target: "floating-point default".to_string(),
                message: format!("{} is not a finite number", n),
            })
    }
}

impl From<&str> for DefaultValue {
    fn from(s: &str) -> Self {
        DefaultValue::String(s.to_string())
    }
}

impl From<Vec<u8>> for DefaultValue {
    fn from(bytes: Vec<u8>) -> Self {
        DefaultValue::Bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_classification() {
        assert!(DefaultValue::from(5i64).is_integral());
        assert!(!DefaultValue::from(5i64).is_floating_point());
        assert!(DefaultValue::try_from(2.5f64).unwrap().is_floating_point());
        assert!(DefaultValue::from(json!(18446744073709551615u64)).is_integral());
    }

    #[test]
    fn test_non_finite_float_rejected() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                DefaultValue::try_from(n),
                Err(SchemaError::DefaultValueParse { .. })
            ));
        }
    }

    #[test]
    fn test_parse_default_text() {
        assert_eq!(DefaultValue::parse("null", "f").unwrap(), DefaultValue::Null);
        assert_eq!(
            DefaultValue::parse("[1, 2]", "f").unwrap(),
            DefaultValue::Array(vec![DefaultValue::from(1i64), DefaultValue::from(2i64)])
        );
        let err = DefaultValue::parse("not json", "property 'Order.id'").unwrap_err();
        assert!(err.to_string().contains("Order.id"));
    }

    #[test]
    fn test_bytes_encode_as_latin1_string() {
        let value = DefaultValue::from(vec![0x41, 0xff]);
        assert_eq!(value.to_json(), json!("A\u{ff}"));
    }

    #[test]
    fn test_deserialize_keeps_explicit_null() {
        let value: DefaultValue = serde_json::from_str("null").unwrap();
        assert_eq!(value, DefaultValue::Null);
        let value: DefaultValue = serde_json::from_str(r#"{"a": true}"#).unwrap();
        assert!(matches!(value, DefaultValue::Object(_)));
    }
}

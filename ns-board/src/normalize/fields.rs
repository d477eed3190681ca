//! Total accessors over loosely typed JSON.
//!
//! The NS API is inconsistent about types: train numbers arrive as strings
//! on one endpoint and integers on another, UIC codes flip between the two,
//! and optional fields are sometimes `null` and sometimes absent. Every
//! accessor here coerces what it reasonably can and returns `None` for the
//! rest, so projections decide per field whether absence is an error.

use serde_json::{Map, Value};

use super::error::NormalizeError;

/// Read a value as a string. Numbers and booleans are rendered as text.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a value as an integer. Accepts integral floats and numeric strings.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a value as a float. Accepts numeric strings.
pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Read a value as a boolean. Accepts `"true"`/`"false"` and `0`/`1`.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Field access over one JSON object.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Wrap a value that must be an object. `what` names it in the error.
    pub fn of(value: &'a Value, what: &'static str) -> Result<Self, NormalizeError> {
        value
            .as_object()
            .map(|object| Fields { object })
            .ok_or(NormalizeError::NotAnObject(what))
    }

    /// Wrap a value if it is an object.
    pub fn try_of(value: &'a Value) -> Option<Self> {
        value.as_object().map(|object| Fields { object })
    }

    /// Raw access. `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(as_string)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(as_int)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(as_float)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(as_bool)
    }

    /// Nested object, if present and an object.
    pub fn object(&self, key: &str) -> Option<Fields<'a>> {
        self.get(key).and_then(Fields::try_of)
    }

    /// Array elements, or an empty slice if absent or not an array.
    pub fn array(&self, key: &str) -> &'a [Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Array that must be present.
    pub fn require_array(&self, key: &'static str) -> Result<&'a [Value], NormalizeError> {
        let value = self.get(key).ok_or(NormalizeError::MissingField(key))?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or(NormalizeError::WrongType {
                field: key,
                expected: "array",
            })
    }

    pub fn require_string(&self, key: &'static str) -> Result<String, NormalizeError> {
        self.require(key, "string", as_string)
    }

    pub fn require_int(&self, key: &'static str) -> Result<i64, NormalizeError> {
        self.require(key, "integer", as_int)
    }

    pub fn require_float(&self, key: &'static str) -> Result<f64, NormalizeError> {
        self.require(key, "number", as_float)
    }

    fn require<T>(
        &self,
        key: &'static str,
        expected: &'static str,
        read: fn(&Value) -> Option<T>,
    ) -> Result<T, NormalizeError> {
        let value = self.get(key).ok_or(NormalizeError::MissingField(key))?;
        read(value).ok_or(NormalizeError::WrongType {
            field: key,
            expected,
        })
    }
}

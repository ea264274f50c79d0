//! Typed access to fields of loosely structured export records.
//!
//! Export formats are permissive about which fields appear, but a field that
//! does appear with the wrong JSON type means the whole file is in a format
//! we do not understand. The helpers here encode that rule: absent or `null`
//! yields `Ok(None)`, a present value of the wrong type yields
//! [`VaultError::MalformedSource`].

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, VaultError};
use crate::time_utils::TimezoneHandler;

pub type JsonObject = Map<String, Value>;

// ── FieldExtractor ────────────────────────────────────────────────────────────

/// Strict field accessors over a JSON object.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Interpret `value` as an object or fail with a descriptive error.
    pub fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a JsonObject> {
        value
            .as_object()
            .ok_or_else(|| malformed(format!("{} is {}, expected an object", what, type_name(value))))
    }

    /// Interpret `value` as an array or fail with a descriptive error.
    pub fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
        value
            .as_array()
            .ok_or_else(|| malformed(format!("{} is {}, expected an array", what, type_name(value))))
    }

    /// A string field. Absent or `null` → `None`.
    pub fn optional_str<'a>(obj: &'a JsonObject, key: &str) -> Result<Option<&'a str>> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(wrong_type(key, other, "a string")),
        }
    }

    /// A numeric field. Absent or `null` → `None`; strings are rejected.
    pub fn optional_f64(obj: &JsonObject, key: &str) -> Result<Option<f64>> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| malformed(format!("field \"{}\" is not a finite number", key))),
            Some(other) => Err(wrong_type(key, other, "a number")),
        }
    }

    /// A numeric field that may also be encoded as a numeric string, as
    /// profile editors commonly do (`"value": "0.55"`).
    pub fn lenient_f64(obj: &JsonObject, key: &str) -> Result<Option<f64>> {
        match obj.get(key) {
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| malformed(format!("field \"{}\" is not numeric: \"{}\"", key, s))),
            _ => Self::optional_f64(obj, key),
        }
    }

    /// A numeric field that must be present.
    pub fn require_f64(obj: &JsonObject, key: &str, context: &str) -> Result<f64> {
        Self::optional_f64(obj, key)?
            .ok_or_else(|| malformed(format!("{} record has no \"{}\" field", context, key)))
    }
}

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Reads timestamps out of export records.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse a timestamp field.
    ///
    /// Handles:
    /// * absent / `null` → `Ok(None)`
    /// * JSON string     → ISO 8601 via [`TimezoneHandler::parse_timestamp`]
    /// * JSON number     → epoch milliseconds; fractional values truncate
    ///
    /// An unparseable string or any other JSON type is an error.
    pub fn parse_field(
        obj: &JsonObject,
        key: &str,
        handler: &TimezoneHandler,
    ) -> Result<Option<DateTime<Utc>>> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => handler
                .parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| VaultError::TimestampParse(s.clone())),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|ms| ms.is_finite() && ms.abs() < i64::MAX as f64)
                        .map(|ms| ms.trunc() as i64)
                })
                .and_then(|ms| handler.from_epoch_millis(ms))
                .map(Some)
                .ok_or_else(|| VaultError::TimestampParse(n.to_string())),
            Some(other) => Err(wrong_type(key, other, "a timestamp")),
        }
    }

    /// Return the first present timestamp among `keys`.
    pub fn first_of(
        obj: &JsonObject,
        keys: &[&str],
        handler: &TimezoneHandler,
    ) -> Result<Option<DateTime<Utc>>> {
        for key in keys {
            if let Some(ts) = Self::parse_field(obj, key, handler)? {
                return Ok(Some(ts));
            }
        }
        Ok(None)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn malformed(msg: String) -> VaultError {
    VaultError::MalformedSource(msg)
}

fn wrong_type(key: &str, value: &Value, expected: &str) -> VaultError {
    malformed(format!(
        "field \"{}\" is {}, expected {}",
        key,
        type_name(value),
        expected
    ))
}

/// Human-readable JSON type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

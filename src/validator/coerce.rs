//! String to typed value conversion for path, query, header and cookie values.
//!
//! Rules:
//!
//! | Schema type | Accepted input |
//! |-------------|----------------|
//! | `integer` | optional sign and ASCII digits, within `i64` (and `i32` for `format: int32`) |
//! | `number` | an integer as above, else any finite `f64` literal |
//! | `boolean` | `true`, `false`, `1`, `0` |
//! | `array` | repeated values or a comma separated list, items coerced by `items` |
//! | anything else | the string as is |

use serde_json::{Number, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub message: String,
}

impl CoercionError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CoercionError {}

/// The effective type of a schema; the first non-null entry of a type union.
fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// Coerce every occurrence of a parameter.
///
/// `split` is true when array items arrive comma separated inside each occurrence.
pub fn coerce_parameter(
    values: &[&str],
    schema: &Value,
    split: bool,
) -> Result<Value, CoercionError> {
    if schema_type(schema) == Some("array") {
        let items_schema = schema.get("items").unwrap_or(&Value::Null);
        let raw: Vec<&str> = if split {
            values
                .iter()
                .flat_map(|v| v.split(','))
                .filter(|v| !v.is_empty())
                .collect()
        } else {
            values.to_vec()
        };
        return raw
            .into_iter()
            .map(|item| coerce_scalar(item, items_schema))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    // last occurrence wins for scalars
    match values.last() {
        Some(value) => coerce_scalar(value, schema),
        None => Ok(Value::Null),
    }
}

/// Coerce one string according to the schema's type.
pub fn coerce_scalar(raw: &str, schema: &Value) -> Result<Value, CoercionError> {
    match schema_type(schema) {
        Some("integer") => {
            let n = parse_integer(raw)?;
            if schema.get("format").and_then(Value::as_str) == Some("int32")
                && i32::try_from(n).is_err()
            {
                return Err(CoercionError::new("Integer out of range for int32."));
            }
            Ok(Value::from(n))
        }
        Some("number") => parse_number(raw),
        Some("boolean") => match raw {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(CoercionError::new(format!("Expected boolean, got \"{raw}\"."))),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_integer(raw: &str) -> Result<i64, CoercionError> {
    if !is_integer_literal(raw) {
        return Err(CoercionError::new(format!("Expected integer, got \"{raw}\".")));
    }
    raw.parse::<i64>()
        .map_err(|_| CoercionError::new("Integer out of range."))
}

fn parse_number(raw: &str) -> Result<Value, CoercionError> {
    if is_integer_literal(raw) {
        if let Ok(n) = raw.parse::<i64>() {
            return Ok(Value::from(n));
        }
    }
    let invalid = || CoercionError::new(format!("Expected number, got \"{raw}\"."));
    let n: f64 = raw.parse().map_err(|_| invalid())?;
    Number::from_f64(n).map(Value::Number).ok_or_else(invalid)
}

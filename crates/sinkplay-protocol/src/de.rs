//! Lenient field decoders for the irregular parts of the wire format.
//!
//! Real SyncPlay servers are not consistent about field types. Python's
//! `None` sometimes reaches the wire as `null`, sometimes as the string
//! `"<null>"`; durations are numbers formatted as strings; `file` can be an
//! empty object. Each helper here is used through
//! `#[serde(deserialize_with = "...")]` and spells out its fallback order
//! explicitly instead of hoping one fixed schema fits every server.
//!
//! Every helper first captures the raw `serde_json::Value`, then picks a
//! branch. That costs an allocation per field, which is irrelevant at
//! SyncPlay message rates and keeps each fallback chain in one `match`.

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;

use crate::types::FileInfo;

/// A boolean that may also arrive as `null` or as a sentinel string.
///
/// Fallback order:
/// 1. JSON boolean → its value
/// 2. any JSON string (e.g. `"<null>"`) → `false`
/// 3. JSON `null` → `false`
/// 4. anything else → error
pub(crate) fn nullable_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::String(_) | Value::Null => Ok(false),
        other => Err(D::Error::custom(format!(
            "expected boolean, null, or sentinel string, found {}",
            kind_of(&other)
        ))),
    }
}

/// An integer index that may also be `null` or a sentinel string.
///
/// Fallback order:
/// 1. non-negative JSON integer → `Some(index)`
/// 2. any JSON string → `None`
/// 3. JSON `null` → `None`
/// 4. anything else → error
pub(crate) fn nullable_index<'de, D>(
    deserializer: D,
) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| {
            D::Error::custom(format!("index {n} is not a non-negative integer"))
        }),
        Value::String(_) | Value::Null => Ok(None),
        other => Err(D::Error::custom(format!(
            "expected integer index, null, or sentinel string, found {}",
            kind_of(&other)
        ))),
    }
}

/// A duration in seconds, usually sent as a numeric string like `"1432.5"`.
///
/// Never fails: anything that does not yield a finite number means "no
/// duration known".
pub(crate) fn lenient_duration<'de, D>(
    deserializer: D,
) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    Ok(seconds.filter(|s| s.is_finite()))
}

/// A byte size: a non-negative integer, occasionally stringly-typed.
///
/// Never fails; unrecognised values mean "size unknown".
pub(crate) fn lenient_size<'de, D>(
    deserializer: D,
) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// An optional `file` sub-object.
///
/// Absent, `null`, `{}`, or any object missing a usable `name` all decode
/// to `None` without failing the enclosing user entry.
pub(crate) fn optional_file<'de, D>(
    deserializer: D,
) -> Result<Option<FileInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    match serde_json::from_value::<FileInfo>(value) {
        Ok(file) => Ok(Some(file)),
        Err(e) => {
            tracing::trace!(error = %e, "ignoring unusable file object");
            Ok(None)
        }
    }
}

/// Human-readable JSON type name for error messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

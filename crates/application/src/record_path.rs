//! Dotted-path access into opaque entity payloads.

use serde_json::Value;

/// Resolves a dotted path against a JSON payload.
///
/// Object segments select keys; numeric segments index arrays. Returns
/// `None` for empty segments and for paths that do not exist.
pub fn value_at<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }

        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Resolves a dotted path to a non-null value.
pub fn present_value_at<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    value_at(payload, path).filter(|value| !value.is_null())
}

/// Reads a numeric identifier stored either as a number or a numeric string.
pub fn id_at(payload: &Value, path: &str) -> Option<i64> {
    match present_value_at(payload, path)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Returns the textual form used for string comparisons and rendering.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

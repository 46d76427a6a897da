//! Built-in shortcut groups

pub mod planner;
pub mod study;

use serde_json::Value;

/// String parameter, empty when missing
pub(crate) fn param<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or("")
}

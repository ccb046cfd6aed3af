//! Output formats for rendered properties.
//!
//! `KEY=VALUE` lines suit env-injection files; the JSON object suits
//! tools that consume structured output.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Render properties as `KEY=VALUE` lines, sorted by key.
pub fn to_env_lines(properties: &BTreeMap<String, String>) -> String {
    properties
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

/// Render properties as a pretty-printed JSON object.
pub fn to_json(properties: &BTreeMap<String, String>) -> String {
    let object: Map<String, Value> = properties
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    // A map of strings always serializes.
    serde_json::to_string_pretty(&Value::Object(object)).unwrap_or_default()
}

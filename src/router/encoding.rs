//! Flattening of JSON parameters into `key=value` pairs.
//!
//! Nested values use the bracket convention most web backends accept:
//! arrays become `key[]=v`, objects become `key[sub]=v`, booleans are
//! written as `1`/`0` and `null` as an empty value. Keys are emitted in
//! sorted order.

use serde_json::Value;

use super::Parameters;

/// Flattens `params` into ordered `(key, value)` pairs.
#[must_use]
pub fn query_pairs(params: &Parameters) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in sorted(params) {
        push_component(&mut pairs, key.clone(), value);
    }
    pairs
}

/// Serializes `params` as an `application/x-www-form-urlencoded` string.
#[must_use]
pub fn form_encode(params: &Parameters) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query_pairs(params))
        .finish()
}

fn sorted(map: &Parameters) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn push_component(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (sub, nested) in sorted(map) {
                push_component(pairs, format!("{key}[{sub}]"), nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                push_component(pairs, format!("{key}[]"), item);
            }
        }
        Value::Bool(flag) => pairs.push((key, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Null => pairs.push((key, String::new())),
    }
}

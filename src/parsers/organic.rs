//! Organic result extraction from a search payload.

use serde_json::Value;

use crate::models::OrganicResult;

/// Extract organic entries from a raw search payload, in provider order.
///
/// Non-object items are skipped. Entries missing a position or link are
/// kept; deciding what gets stored is up to the caller.
pub fn parse_organic(payload: &Value) -> Vec<OrganicResult> {
    let Some(items) = payload.get("organic").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| OrganicResult {
            position: item.get("position").and_then(parse_position),
            title: string_field(item, "title"),
            link: string_field(item, "link"),
            snippet: string_field(item, "snippet"),
            raw: item.clone(),
        })
        .collect()
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Positions arrive as integers, integral floats, or numeric strings.
fn parse_position(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

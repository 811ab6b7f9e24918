//! Text-column encoding for the list-valued dish fields.
//!
//! `ingredients`, `instructions` and `tags` are persisted as a JSON array in a
//! single TEXT column. Reads never fail: anything that is not a JSON array
//! decodes to an empty list.

use serde_json::Value;

pub fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| String::from("[]"))
}

pub fn decode_list(cell: Option<&str>) -> Vec<String> {
    let Some(text) = cell.filter(|t| !t.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

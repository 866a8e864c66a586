//! Pulls item ids out of an upstream catalog envelope.
//!
//! The upstream answers `{"code": 200, "data": {"items": [{"_id": ...}, ...]}}`.
//! Items are heterogeneous, so the envelope is walked as untyped JSON and any
//! shape mismatch degrades to "no ids" rather than an error.

use serde_json::Value;

/// Envelope `code` that marks a usable upstream answer.
pub const UPSTREAM_OK: i64 = 200;

/// Returns the `_id` of every item in `envelope.data.items`, in order.
///
/// Returns an empty list when the envelope is absent, its `code` is not
/// numerically 200, or `data.items` is missing or not an array. `200` and
/// `200.0` both count; the string `"200"` does not. Items without a usable
/// `_id` are skipped. String ids are taken verbatim; numeric ids are
/// rendered to their JSON text.
pub fn extract_ids(envelope: Option<&Value>) -> Vec<String> {
    let Some(envelope) = envelope else {
        return Vec::new();
    };

    if !envelope.get("code").is_some_and(is_ok_code) {
        return Vec::new();
    }

    let Some(items) = envelope
        .get("data")
        .and_then(|data| data.get("items"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("_id"))
        .filter_map(id_text)
        .collect()
}

fn is_ok_code(code: &Value) -> bool {
    match code.as_i64() {
        Some(code) => code == UPSTREAM_OK,
        None => code
            .as_f64()
            .is_some_and(|code| (code - UPSTREAM_OK as f64).abs() < f64::EPSILON),
    }
}

fn id_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! The tagged JSON object returned at the outer boundary.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::WalletError;

/// `{"success": true, ...fields}` or
/// `{"success": false, "error": "...", "retryable": bool}`.
///
/// Values that do not serialize to a JSON object are placed under `result`.
pub fn envelope<T: Serialize>(result: &Result<T, WalletError>) -> Value {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => {
                let mut out = Map::with_capacity(fields.len() + 1);
                out.insert("success".into(), Value::Bool(true));
                out.extend(fields);
                Value::Object(out)
            }
            Ok(other) => json!({ "success": true, "result": other }),
            Err(e) => failure(&format!("failed to serialize result: {e}"), false),
        },
        Err(e) => failure(&e.to_string(), e.is_retryable()),
    }
}

fn failure(message: &str, retryable: bool) -> Value {
    json!({
        "success": false,
        "error": message,
        "retryable": retryable,
    })
}

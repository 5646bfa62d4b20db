//! Masking of secrets in request bodies before they are logged.

use serde_json::Value;

use crate::model::MASKED;

/// Field-name fragments treated as secrets (matched case-insensitively).
const SENSITIVE_FRAGMENTS: [&str; 7] = [
    "password",
    "sig",
    "token",
    "apikey",
    "secret",
    "authorization",
    "credential",
];

pub fn is_sensitive(field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS
        .iter()
        .any(|fragment| field.contains(fragment))
}

/// Replace the value of every sensitive field, at any depth, with `[MASKED]`.
pub fn mask_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if is_sensitive(key) {
                    *field = Value::String(MASKED.to_string());
                } else {
                    mask_sensitive(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_sensitive),
        _ => {}
    }
}

/// Loggable form of a raw body. Bodies that are not JSON are not echoed at all.
pub fn masked_body(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(mut value) => {
            mask_sensitive(&mut value);
            value.to_string()
        }
        Err(_) => format!("<{} bytes, not JSON>", raw.len()),
    }
}

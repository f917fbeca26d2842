//! Helpers shared by the fetch-based adapters.

use chat_types::ChatError;
use serde_json::Value;

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub fn network_error(e: gloo_net::Error) -> ChatError {
    ChatError::Network(e.to_string())
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Pull a human-readable message out of a JSON error body.
///
/// The auth, REST and function endpoints each use a different field name.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

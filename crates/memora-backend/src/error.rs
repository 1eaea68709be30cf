//! Mapping of backend error responses onto memora errors.

use memora_core::Error;

/// Fields that carry the human-readable message, in lookup order.
///
/// The auth API uses `msg` / `error_description`, the data API uses `message`.
const MESSAGE_FIELDS: [&str; 4] = ["msg", "message", "error_description", "error"];

/// Build an [`Error::Backend`] from a non-success status and its body.
pub fn from_response(status: u16, body: &str) -> Error {
    Error::Backend {
        status,
        message: extract_message(status, body),
    }
}

fn extract_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in MESSAGE_FIELDS {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Backend returned status {}", status)
    } else {
        trimmed.to_string()
    }
}

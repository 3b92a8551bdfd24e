use crate::types::outbound::{OutboundResult, BINARY_RESPONSE};
use bytes::Bytes;

/// Decodes a successful upstream body: JSON first, then text, then a
/// descriptor for bodies that are not UTF-8. Never fails.
pub fn decode_body(status: u16, content_type: Option<&str>, body: &Bytes) -> OutboundResult {
    if let Ok(value) = serde_json::from_slice(body) {
        return OutboundResult::Json(value);
    }

    match std::str::from_utf8(body) {
        Ok(text) => OutboundResult::Text {
            data: text.to_string(),
        },
        Err(_) => OutboundResult::Binary {
            error: BINARY_RESPONSE,
            content_type: content_type.unwrap_or("unknown").to_string(),
            content_length: body.len(),
            status_code: status,
        },
    }
}

/// Text of an upstream error body, or a length placeholder when it is binary.
pub fn error_text(body: &Bytes) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("Binary response ({} bytes)", body.len()),
    }
}

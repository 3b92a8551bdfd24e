use http::{HeaderMap, Method};
use serde::Serialize;
use serde_json::Value;

/// One request to the upstream, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct OutboundCall {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl OutboundCall {
    pub fn get(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, headers: HeaderMap, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            headers,
            body: Some(body),
        }
    }
}

pub const BINARY_RESPONSE: &str = "Binary or non-UTF-8 response";

/// Decoded upstream body, returned to the caller as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundResult {
    Json(Value),
    Text {
        data: String,
    },
    Binary {
        error: &'static str,
        content_type: String,
        content_length: usize,
        status_code: u16,
    },
}

use crate::config::LoggingConfig;
use chrono::{DateTime, Utc};
use http::header::HeaderMap;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct UpstreamRequestLog {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamResponseLog {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub duration_ms: u64,
}

/// Renders a record as one JSON line for the log sinks.
fn to_json_line(log: &impl Serialize) -> String {
    serde_json::to_string(log).unwrap_or_else(|e| format!("<unserializable log record: {}>", e))
}

/// Structured records for one outbound call, from entry to outcome.
pub struct UpstreamLogger<'a> {
    config: &'a LoggingConfig,
    method: &'a str,
    url: &'a str,
    start_time: Instant,
}

impl<'a> UpstreamLogger<'a> {
    pub fn new(config: &'a LoggingConfig, method: &'a str, url: &'a str) -> Self {
        Self {
            config,
            method,
            url,
            start_time: Instant::now(),
        }
    }

    pub fn log_request(&self, attempt: u32, headers: &HeaderMap, body: Option<&serde_json::Value>) {
        tracing::info!("Making {} request to: {}", self.method, self.url);

        if !self.config.include_headers && !self.config.include_body {
            return;
        }

        let log = UpstreamRequestLog {
            timestamp: Utc::now(),
            method: self.method.to_string(),
            url: self.url.to_string(),
            attempt,
            headers: if self.config.include_headers {
                Some(Self::headers_to_map(headers))
            } else {
                None
            },
            body: if self.config.include_body {
                body.map(|b| b.to_string())
            } else {
                None
            },
        };

        tracing::debug!(log = %to_json_line(&log), "Upstream request");
    }

    pub fn log_response(&self, status_code: u16) {
        let log = UpstreamResponseLog {
            timestamp: Utc::now(),
            method: self.method.to_string(),
            url: self.url.to_string(),
            status_code,
            duration_ms: self.start_time.elapsed().as_millis() as u64,
        };

        let log = to_json_line(&log);
        if status_code >= 500 {
            tracing::error!(log = %log, "Response status: {}", status_code);
        } else if status_code >= 400 {
            tracing::warn!(log = %log, "Response status: {}", status_code);
        } else {
            tracing::info!(log = %log, "Response status: {}", status_code);
        }
    }

    pub fn log_failure(&self, error: &dyn std::fmt::Display) {
        tracing::error!(
            method = self.method,
            url = self.url,
            duration_ms = self.start_time.elapsed().as_millis() as u64,
            error = %error,
            "Upstream call failed"
        );
    }

    fn headers_to_map(headers: &HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                let key = name.to_string();
                let val = value.to_str().unwrap_or("<invalid>").to_string();

                // Redact sensitive headers
                let val = if Self::is_sensitive_header(&key) {
                    "[REDACTED]".to_string()
                } else {
                    val
                };

                (key, val)
            })
            .collect()
    }

    fn is_sensitive_header(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.contains("authorization")
            || lower.contains("cookie")
            || lower.contains("api-key")
            || lower.contains("token")
            || lower.contains("secret")
    }
}

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Method {0} not allowed")]
    MethodNotSupported(String),

    #[error("Rate limit exceeded: {limit}")]
    RateLimited { limit: String, retry_after: Duration },

    #[error("Request timeout")]
    Timeout,

    #[error("Saweria API error: {message}")]
    Upstream { status: u16, message: String },

    #[error("Saweria API still rate limiting after {attempts} attempts")]
    UpstreamRateLimited { attempts: u32 },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::MethodNotSupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::UpstreamRateLimited { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            ProxyError::Config(_) => "configuration_error",
            ProxyError::BadRequest(_) => "bad_request",
            ProxyError::MethodNotSupported(_) => "method_not_supported",
            ProxyError::RateLimited { .. } => "rate_limited",
            ProxyError::Timeout => "timeout",
            ProxyError::Upstream { .. } => "upstream_error",
            ProxyError::UpstreamRateLimited { .. } => "upstream_rate_limited",
            ProxyError::Internal(_) => "internal_error",
        }
    }

    /// True for the upstream's own 429, which the retry loop absorbs.
    pub fn is_upstream_rate_limit(&self) -> bool {
        matches!(self, ProxyError::Upstream { status: 429, .. })
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Internal(e.to_string())
        }
    }
}

// Implement IntoResponse for ProxyError to convert errors into HTTP responses
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_type = error_type,
                status = status.as_u16(),
                message = %message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_type = error_type,
                status = status.as_u16(),
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "code": status.as_u16(),
            }
        }));

        let mut response = (status, body).into_response();
        if let ProxyError::RateLimited { retry_after, .. } = &self {
            // Round up so clients never retry inside the window.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProxyError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::MethodNotSupported("PUT".into()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ProxyError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ProxyError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::UpstreamRateLimited { attempts: 4 }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_upstream_status_is_passed_through() {
        let err = ProxyError::Upstream {
            status: 404,
            message: "not found".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Saweria API error: not found");

        let bogus = ProxyError::Upstream {
            status: 42,
            message: String::new(),
        };
        assert_eq!(bogus.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_only_upstream_429_is_rate_limit() {
        assert!(ProxyError::Upstream {
            status: 429,
            message: String::new()
        }
        .is_upstream_rate_limit());
        assert!(!ProxyError::Upstream {
            status: 503,
            message: String::new()
        }
        .is_upstream_rate_limit());
        assert!(!ProxyError::RateLimited {
            limit: "1 per 60 second(s)".into(),
            retry_after: Duration::from_secs(1)
        }
        .is_upstream_rate_limit());
    }

    #[tokio::test]
    async fn test_rate_limited_response_has_retry_after() {
        let response = ProxyError::RateLimited {
            limit: "30 per 60 second(s)".into(),
            retry_after: Duration::from_millis(12_300),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "13");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "rate_limited");
        assert_eq!(json["error"]["code"], 429);
    }
}

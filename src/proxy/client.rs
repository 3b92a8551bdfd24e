use crate::backends::Upstream;
use crate::config::{LoggingConfig, UpstreamConfig};
use crate::logging::UpstreamLogger;
use crate::proxy::decode::{decode_body, error_text};
use crate::proxy::headers::apply_browser_headers;
use crate::proxy::retry::retry_on_rate_limit;
use crate::types::{OutboundCall, OutboundResult, ProxyError, Result};
use async_trait::async_trait;
use http::{header::CONTENT_TYPE, Method, StatusCode};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};

/// Pooled client for the payment provider.
///
/// At most `max_concurrent_requests` calls hold a gate permit at once; the
/// permit covers pacing, every retry and decoding, and is released when the
/// call finishes or its future is dropped.
pub struct UpstreamClient {
    client: Client,
    gate: Arc<Semaphore>,
    config: Arc<UpstreamConfig>,
    logging: Arc<LoggingConfig>,
}

impl UpstreamClient {
    pub fn new(config: Arc<UpstreamConfig>, logging: Arc<LoggingConfig>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            base_url = %config.base_url,
            max_concurrent = config.max_concurrent_requests,
            pacing_ms = config.pacing_delay.as_millis() as u64,
            timeout_ms = config.request_timeout.as_millis() as u64,
            "Upstream client initialized"
        );

        Ok(Self {
            client,
            gate: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            config,
            logging,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Number of calls currently holding a gate permit.
    pub fn in_flight(&self) -> usize {
        self.config.max_concurrent_requests - self.gate.available_permits()
    }

    pub async fn execute(&self, call: &OutboundCall) -> Result<OutboundResult> {
        let url = self.url_for(&call.path);
        let logger = UpstreamLogger::new(&self.logging, call.method.as_str(), &url);

        if call.method != Method::GET && call.method != Method::POST {
            let err = ProxyError::MethodNotSupported(call.method.to_string());
            logger.log_failure(&err);
            return Err(err);
        }

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProxyError::Internal(format!("Concurrency gate closed: {}", e)))?;
        tracing::debug!(in_flight = self.in_flight(), "Acquired upstream slot");

        let mut attempt = 0;
        let outcome = timeout(
            self.config.request_timeout,
            retry_on_rate_limit(&self.config.retry, || {
                attempt += 1;
                self.dispatch(call, &url, attempt, &logger)
            }),
        )
        .await;

        let result = outcome.unwrap_or(Err(ProxyError::Timeout));
        if let Err(e) = &result {
            logger.log_failure(e);
        }
        result
    }

    async fn dispatch(
        &self,
        call: &OutboundCall,
        url: &str,
        attempt: u32,
        logger: &UpstreamLogger<'_>,
    ) -> Result<OutboundResult> {
        sleep(self.config.pacing_delay).await;

        let headers = apply_browser_headers(&call.headers, &call.method);
        logger.log_request(attempt, &headers, call.body.as_ref());

        let mut request = self
            .client
            .request(call.method.clone(), url)
            .headers(headers);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        logger.log_response(status.as_u16());

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        if status == StatusCode::TOO_MANY_REQUESTS
            || status.is_client_error()
            || status.is_server_error()
        {
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                message: error_text(&body),
            });
        }

        Ok(decode_body(status.as_u16(), content_type.as_deref(), &body))
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    async fn call(&self, call: OutboundCall) -> Result<OutboundResult> {
        self.execute(&call).await
    }
}

use crate::config::RetryConfig;
use crate::types::{ProxyError, Result};
use std::future::Future;
use tokio::time::sleep;

/// Runs `operation`, retrying after `config.cooldown` while the upstream
/// answers 429. Gives up with `UpstreamRateLimited` after
/// `config.max_retries` retries; every other outcome is returned as is.
pub async fn retry_on_rate_limit<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Err(e) if e.is_upstream_rate_limit() => {
                if attempt > config.max_retries {
                    tracing::warn!(
                        attempts = attempt,
                        max_retries = config.max_retries,
                        "Upstream rate limit persisted, giving up"
                    );
                    return Err(ProxyError::UpstreamRateLimited { attempts: attempt });
                }

                tracing::warn!(
                    attempt = attempt,
                    delay_ms = config.cooldown.as_millis() as u64,
                    "Rate limit hit, retrying after delay"
                );
                sleep(config.cooldown).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn rate_limited() -> ProxyError {
        ProxyError::Upstream {
            status: 429,
            message: "Too many requests".to_string(),
        }
    }

    fn config(max_retries: u32, cooldown_ms: u64) -> RetryConfig {
        RetryConfig {
            max_retries,
            cooldown: Duration::from_millis(cooldown_ms),
        }
    }

    #[tokio::test]
    async fn test_single_429_is_retried_once() {
        let config = config(3, 20);
        let started = Instant::now();

        let mut attempts = 0;
        let result = retry_on_rate_limit(&config, || {
            attempts += 1;
            async move {
                if attempts < 2 {
                    Err(rate_limited())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 2);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_persistent_429_is_bounded() {
        let config = config(2, 1);

        let mut attempts = 0;
        let result = retry_on_rate_limit(&config, || {
            attempts += 1;
            async move { Err::<(), _>(rate_limited()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(ProxyError::UpstreamRateLimited { attempts: 3 })
        ));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_zero_retries_fails_on_first_429() {
        let config = config(0, 1);

        let mut attempts = 0;
        let result = retry_on_rate_limit(&config, || {
            attempts += 1;
            async move { Err::<(), _>(rate_limited()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(ProxyError::UpstreamRateLimited { attempts: 1 })
        ));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let config = config(3, 1);

        let mut attempts = 0;
        let result = retry_on_rate_limit(&config, || {
            attempts += 1;
            async move {
                Err::<(), _>(ProxyError::Upstream {
                    status: 503,
                    message: "Service unavailable".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ProxyError::Upstream { status: 503, .. })));
        assert_eq!(attempts, 1);

        let mut attempts = 0;
        let result = retry_on_rate_limit(&config, || {
            attempts += 1;
            async move { Err::<(), _>(ProxyError::Timeout) }
        })
        .await;

        assert!(matches!(result, Err(ProxyError::Timeout)));
        assert_eq!(attempts, 1);
    }
}

use crate::config::RateLimit;
use crate::types::ProxyError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CLEANUP_THRESHOLD: usize = 1000;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request budget for one route, keyed by caller IP.
pub struct RateLimiter {
    route: &'static str,
    limit: RateLimit,
    windows: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    pub fn new(route: &'static str, limit: RateLimit) -> Self {
        tracing::info!(route = route, limit = %limit, "Registered rate limit");
        Self {
            route,
            limit,
            windows: DashMap::new(),
        }
    }

    /// Counts one request from `client`. Returns the time until the window
    /// resets when the budget is already spent.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), Duration> {
        self.cleanup_if_needed(now);

        let mut window = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.limit.period {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.limit.requests {
            let reset_in = self
                .limit
                .period
                .saturating_sub(now.duration_since(window.started));
            return Err(reset_in);
        }

        window.count += 1;
        Ok(())
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    fn cleanup_if_needed(&self, now: Instant) {
        if self.windows.len() > CLEANUP_THRESHOLD {
            let period = self.limit.period;
            self.windows
                .retain(|_, w| now.duration_since(w.started) < period);
        }
    }
}

/// Axum middleware rejecting requests over the route's budget before the
/// handler (and therefore any upstream work) runs.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ProxyError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if let Err(retry_after) = limiter.check(client) {
        tracing::warn!(
            route = limiter.route,
            method = %request.method(),
            path = request.uri().path(),
            client = %client,
            "Inbound rate limit exceeded"
        );
        return Err(ProxyError::RateLimited {
            limit: limiter.limit().to_string(),
            retry_after,
        });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, last))
    }

    #[test]
    fn test_budget_exhausted_within_window() {
        let limiter = RateLimiter::new("test", RateLimit::per_minute(3));
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(ip(1), now).is_ok());
        }

        let retry_after = limiter.check_at(ip(1), now).unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(60));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new("test", RateLimit::per_minute(1));
        let now = Instant::now();

        assert!(limiter.check_at(ip(1), now).is_ok());
        assert!(limiter.check_at(ip(1), now).is_err());
        assert!(limiter.check_at(ip(2), now).is_ok());
    }

    #[test]
    fn test_window_resets_after_period() {
        let limiter = RateLimiter::new(
            "test",
            RateLimit {
                requests: 2,
                period: Duration::from_secs(10),
            },
        );
        let start = Instant::now();

        assert!(limiter.check_at(ip(1), start).is_ok());
        assert!(limiter.check_at(ip(1), start).is_ok());

        let later = start + Duration::from_secs(4);
        assert_eq!(
            limiter.check_at(ip(1), later).unwrap_err(),
            Duration::from_secs(6)
        );

        let next_window = start + Duration::from_secs(10);
        assert!(limiter.check_at(ip(1), next_window).is_ok());
    }

    #[test]
    fn test_stale_windows_are_swept() {
        let limiter = RateLimiter::new("test", RateLimit::per_minute(5));
        let start = Instant::now();

        for i in 0..=CLEANUP_THRESHOLD as u32 {
            let addr = IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i));
            assert!(limiter.check_at(addr, start).is_ok());
        }
        assert_eq!(limiter.windows.len(), CLEANUP_THRESHOLD + 1);

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at(ip(1), later).is_ok());
        assert_eq!(limiter.windows.len(), 1);
    }
}

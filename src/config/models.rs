use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

static RATE_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:/|per)\s*(\d+)?\s*(second|minute|hour|day)s?\s*$")
        .expect("Rate limit regex is valid")
});

pub const DEFAULT_BASE_URL: &str = "https://backend.saweria.co";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub upstream: UpstreamConfig,
    pub rate_limits: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    /// Log outbound headers (redacted) and bodies.
    pub include_headers: bool,
    pub include_body: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("logs/payment_gateway.log")),
            include_headers: false,
            include_body: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub username: String,
    pub donation_id: String,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub pacing_delay: Duration,
    pub retry: RetryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: String::new(),
            donation_id: String::new(),
            request_timeout: Duration::from_secs(30),
            max_concurrent_requests: 10,
            pacing_delay: Duration::from_millis(500),
            retry: RetryConfig::default(),
        }
    }
}

/// Policy for upstream 429 responses.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub cooldown: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            cooldown: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    CalculateFee,
    QrisGenerator,
    PaymentStatus,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Health => "health",
            Route::CalculateFee => "calculate_fee",
            Route::QrisGenerator => "qris_generator",
            Route::PaymentStatus => "payment_status",
        }
    }
}

/// Inbound budgets. A route without an override uses `default`.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub default: RateLimit,
    pub calculate_fee: Option<RateLimit>,
    pub qris_generator: Option<RateLimit>,
    pub payment_status: Option<RateLimit>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default: RateLimit::per_minute(100),
            calculate_fee: Some(RateLimit::per_minute(30)),
            qris_generator: Some(RateLimit::per_minute(20)),
            payment_status: Some(RateLimit::per_minute(50)),
        }
    }
}

impl RateLimitConfig {
    pub fn for_route(&self, route: Route) -> RateLimit {
        let specific = match route {
            Route::Health => None,
            Route::CalculateFee => self.calculate_fee,
            Route::QrisGenerator => self.qris_generator,
            Route::PaymentStatus => self.payment_status,
        };
        specific.unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: u32,
    pub period: Duration,
}

impl RateLimit {
    pub fn per_minute(requests: u32) -> Self {
        Self {
            requests,
            period: Duration::from_secs(60),
        }
    }

    /// Parses budgets such as `30/minute`, `30 per minute` or `10/5 seconds`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let caps = RATE_LIMIT_RE
            .captures(input)
            .ok_or_else(|| format!("Invalid rate limit '{}'", input))?;

        let requests: u32 = caps[1]
            .parse()
            .map_err(|e| format!("Invalid request count in '{}': {}", input, e))?;
        if requests == 0 {
            return Err(format!("Rate limit '{}' must allow at least one request", input));
        }

        let multiplier: u64 = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|e| format!("Invalid period in '{}': {}", input, e))?,
            None => 1,
        };
        if multiplier == 0 {
            return Err(format!("Rate limit '{}' has an empty period", input));
        }

        let unit_secs: u64 = match caps[3].to_lowercase().as_str() {
            "second" => 1,
            "minute" => 60,
            "hour" => 3600,
            _ => 86400,
        };

        let period = unit_secs
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Rate limit period in '{}' is too long", input))?;

        Ok(Self {
            requests,
            period: Duration::from_secs(period),
        })
    }
}

impl std::fmt::Display for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} per {} second(s)", self.requests, self.period.as_secs())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.upstream.base_url.is_empty() {
            return Err("Upstream base URL must not be empty".to_string());
        }

        if self.upstream.max_concurrent_requests == 0 {
            return Err("MAX_CONCURRENT_REQUESTS must be > 0".to_string());
        }

        if self.upstream.request_timeout.is_zero() {
            return Err("REQUEST_TIMEOUT must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slash_form() {
        let limit = RateLimit::parse("30/minute").unwrap();
        assert_eq!(limit.requests, 30);
        assert_eq!(limit.period, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_per_form_and_plural() {
        let limit = RateLimit::parse("5 per 10 seconds").unwrap();
        assert_eq!(limit.requests, 5);
        assert_eq!(limit.period, Duration::from_secs(10));

        let limit = RateLimit::parse("1000/Day").unwrap();
        assert_eq!(limit.period, Duration::from_secs(86400));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RateLimit::parse("fast").is_err());
        assert!(RateLimit::parse("10/fortnight").is_err());
        assert!(RateLimit::parse("0/minute").is_err());
        assert!(RateLimit::parse("3/0 hours").is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_period() {
        let err = RateLimit::parse("1/300000000000000 days").unwrap_err();
        assert!(err.contains("too long"));

        let limit = RateLimit::parse("1/300000000000000 seconds").unwrap();
        assert_eq!(limit.period, Duration::from_secs(300_000_000_000_000));
    }

    #[test]
    fn test_route_falls_back_to_default() {
        let config = RateLimitConfig {
            default: RateLimit::per_minute(7),
            calculate_fee: None,
            qris_generator: Some(RateLimit::per_minute(2)),
            payment_status: None,
        };

        assert_eq!(config.for_route(Route::CalculateFee).requests, 7);
        assert_eq!(config.for_route(Route::QrisGenerator).requests, 2);
        assert_eq!(config.for_route(Route::Health).requests, 7);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            upstream: UpstreamConfig::default(),
            rate_limits: RateLimitConfig::default(),
        };
        assert!(config.validate().is_ok());

        config.upstream.max_concurrent_requests = 0;
        assert!(config.validate().is_err());
    }
}

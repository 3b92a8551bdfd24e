use super::models::{
    Config, LoggingConfig, RateLimit, RateLimitConfig, RetryConfig, ServerConfig, UpstreamConfig,
    DEFAULT_BASE_URL,
};
use crate::types::{ProxyError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Loads `.env` (if present) and builds the configuration from the process environment.
pub fn load_config() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(ProxyError::Config(format!("Failed to read .env file: {}", e))),
    }

    load_from(|key| std::env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let server_defaults = ServerConfig::default();
    let debug = lookup("DEBUG")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(server_defaults.debug);

    let server = ServerConfig {
        host: lookup("HOST").unwrap_or(server_defaults.host),
        port: parse_or("PORT", &lookup, server_defaults.port)?,
        debug,
    };

    let log_defaults = LoggingConfig::default();
    let logging = LoggingConfig {
        level: lookup("LOG_LEVEL")
            .map(|v| v.to_lowercase())
            .unwrap_or(log_defaults.level),
        file: match lookup("LOG_FILE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
            None => log_defaults.file,
        },
        include_headers: debug,
        include_body: debug,
    };

    let upstream_defaults = UpstreamConfig::default();
    let retry_defaults = RetryConfig::default();
    let upstream = UpstreamConfig {
        base_url: lookup("SAWERIA_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        username: lookup("USERNAME_SAWERIA").unwrap_or_default(),
        donation_id: lookup("DONATION_ID").unwrap_or_default(),
        request_timeout: seconds_or("REQUEST_TIMEOUT", &lookup, upstream_defaults.request_timeout)?,
        max_concurrent_requests: parse_or(
            "MAX_CONCURRENT_REQUESTS",
            &lookup,
            upstream_defaults.max_concurrent_requests,
        )?,
        pacing_delay: seconds_or("REQUEST_DELAY", &lookup, upstream_defaults.pacing_delay)?,
        retry: RetryConfig {
            max_retries: parse_or("UPSTREAM_MAX_RETRIES", &lookup, retry_defaults.max_retries)?,
            cooldown: seconds_or("RATE_LIMIT_COOLDOWN", &lookup, retry_defaults.cooldown)?,
        },
    };

    let limit_defaults = RateLimitConfig::default();
    let rate_limits = RateLimitConfig {
        default: match lookup("RATE_LIMIT_DEFAULT") {
            Some(v) if !v.trim().is_empty() => parse_limit("RATE_LIMIT_DEFAULT", &v)?,
            _ => limit_defaults.default,
        },
        calculate_fee: route_limit(
            "RATE_LIMIT_CALCULATE_FEE",
            &lookup,
            limit_defaults.calculate_fee,
        )?,
        qris_generator: route_limit(
            "RATE_LIMIT_QRIS_GENERATOR",
            &lookup,
            limit_defaults.qris_generator,
        )?,
        payment_status: route_limit(
            "RATE_LIMIT_PAYMENT_STATUS",
            &lookup,
            limit_defaults.payment_status,
        )?,
    };

    let config = Config {
        server,
        logging,
        upstream,
        rate_limits,
    };

    config
        .validate()
        .map_err(|e| ProxyError::Config(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ProxyError::Config(format!("Invalid value for {}: '{}' ({})", key, raw, e))),
        None => Ok(default),
    }
}

fn seconds_or<F>(key: &str, lookup: &F, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: f64 = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ProxyError::Config(format!("Invalid value for {}: '{}' ({})", key, raw, e)))?,
        None => return Ok(default),
    };

    Duration::try_from_secs_f64(secs)
        .map_err(|e| ProxyError::Config(format!("Invalid duration for {}: {} ({})", key, secs, e)))
}

fn parse_limit(key: &str, raw: &str) -> Result<RateLimit> {
    RateLimit::parse(raw).map_err(|e| ProxyError::Config(format!("{}: {}", key, e)))
}

/// An empty value clears the route override so the global default applies.
fn route_limit<F>(key: &str, lookup: &F, default: Option<RateLimit>) -> Result<Option<RateLimit>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => parse_limit(key, &v).map(Some),
        None => Ok(default),
    }
}

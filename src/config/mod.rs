pub mod loader;
pub mod models;

pub use loader::load_config;
pub use models::{Config, LoggingConfig, RateLimit, RetryConfig, Route, UpstreamConfig};

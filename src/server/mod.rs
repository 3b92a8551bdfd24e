pub mod rate_limit;
pub mod routes;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::backends::Upstream;
use crate::config::{Config, Route};
use rate_limit::{enforce_rate_limit, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
    pub config: Arc<Config>,
}

/// Builds the HTTP surface. Each route gets its own inbound limiter.
///
/// Request spans are recorded at info so rejections logged by `ProxyError`
/// carry the method and URI of the request that caused them.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let limits = &config.rate_limits;
    let limiter = |route: Route| {
        from_fn_with_state(
            Arc::new(RateLimiter::new(route.name(), limits.for_route(route))),
            enforce_rate_limit,
        )
    };

    Router::new()
        .route("/", get(routes::health).route_layer(limiter(Route::Health)))
        .route(
            "/calculate_fee",
            post(routes::calculate_fee).route_layer(limiter(Route::CalculateFee)),
        )
        .route(
            "/qris_generator",
            post(routes::qris_generator).route_layer(limiter(Route::QrisGenerator)),
        )
        .route(
            "/payment_status/:payment_id",
            get(routes::payment_status).route_layer(limiter(Route::PaymentStatus)),
        )
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

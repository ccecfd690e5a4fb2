//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{health, ready};
use crate::handlers::profile::{get_me, put_me};
use crate::handlers::responses::{
    approve_response, get_response, list_my_responses, list_responses, reject_response,
    start_review,
};
use crate::handlers::rfps::{
    browse_rfps, create_rfp, get_rfp, list_own_rfps, publish_rfp, submit_response, update_rfp,
    view_rfp,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let profile_routes = Router::new()
        .route("/me", get(get_me).put(put_me));

    let rfp_routes = Router::new()
        .route("/rfps", get(list_own_rfps).post(create_rfp))
        .route("/rfps/:id", get(get_rfp).put(update_rfp))
        .route("/rfps/:id/publish", post(publish_rfp))
        // Supplier submission
        .route("/rfps/:id/responses", post(submit_response));

    let response_routes = Router::new()
        .route("/responses", get(list_responses))
        .route("/responses/my", get(list_my_responses))
        .route("/responses/:id", get(get_response))
        // Review workflow (owning buyer only)
        .route("/responses/:id/review", put(start_review))
        .route("/responses/:id/approve", put(approve_response))
        .route("/responses/:id/reject", put(reject_response));

    let rate_limiter = Arc::new(
        RateLimiterCache::new(state.config.rate_limit_rps, state.config.rate_limit_burst)
            .with_trusted_proxy_hops(state.config.trusted_proxy_hops),
    );

    // Unauthenticated reads get a tighter budget
    let public_rate_limiter = Arc::new(
        RateLimiterCache::new(state.config.public_rate_limit_rps, state.config.public_rate_limit_rps)
            .with_trusted_proxy_hops(state.config.trusted_proxy_hops),
    );

    let authed_routes = Router::new()
        .merge(profile_routes)
        .merge(rfp_routes)
        .merge(response_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let public_routes = Router::new()
        .route("/rfps/browse", get(browse_rfps))
        .route("/rfps/:id/view", get(view_rfp))
        .layer(middleware::from_fn_with_state(
            public_rate_limiter,
            rate_limit_middleware,
        ));

    let api_routes = Router::new().merge(authed_routes).merge(public_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        // request_logging reads the id, so it sits inside request_id
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

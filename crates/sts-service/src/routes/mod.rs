//! HTTP routes for the token service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers::{self, admin_handler, auth_handler};
use crate::middleware::rate_limit_middleware;
use crate::services::TokenService;
use crate::store::SharedStore;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
pub struct AppState {
    pub service: TokenService,

    /// Store handle used by the readiness probe.
    pub store: Arc<dyn SharedStore>,

    pub config: Config,
}

/// Build the application routes.
///
/// - `/health`, `/ready`, `/metrics` - operational, unversioned, not rate limited
/// - `/api/v1/auth/{token,validate,revoke}` - token endpoints
/// - `/api/v1/admin/*` - operator endpoints, only when enabled
///
/// Every `/api` route passes through the rate-limit middleware.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let mut api_routes = Router::new()
        .route("/api/v1/auth/token", post(auth_handler::issue_token))
        .route("/api/v1/auth/validate", get(auth_handler::validate_token))
        .route("/api/v1/auth/revoke", post(auth_handler::revoke_token));

    if state.config.admin_endpoints_enabled {
        api_routes = api_routes.merge(admin_routes());
    }

    let api_routes = api_routes
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state.clone());

    let operational_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    operational_routes
        .merge(metrics_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/admin/cache/tokens/clear",
            post(admin_handler::clear_token_cache),
        )
        .route(
            "/api/v1/admin/cache/clients/clear",
            post(admin_handler::clear_client_cache),
        )
        .route(
            "/api/v1/admin/cache/invalidate/client/:client_id",
            post(admin_handler::invalidate_client),
        )
        .route(
            "/api/v1/admin/client/:client_id/revoke-token",
            post(admin_handler::revoke_client_session),
        )
        .route(
            "/api/v1/admin/tokens/:token/blacklist",
            post(admin_handler::blacklist_token),
        )
        .route(
            "/api/v1/admin/rate-limit/:address/reset",
            post(admin_handler::reset_rate_limit),
        )
        .route("/api/v1/admin/cache/stats", get(admin_handler::cache_stats))
        .route(
            "/api/v1/admin/debug/cache/:client_id",
            get(admin_handler::debug_client),
        )
}

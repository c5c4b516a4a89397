//! Liveness and readiness probes.
//!
//! - `/health`: returns OK while the process is running
//! - `/ready`: round-trips the shared store

use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub store: &'static str,
}

/// Liveness probe. Checks no dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe: 200 when the store answers a ping, 503 otherwise.
///
/// The store error is logged server-side only.
#[tracing::instrument(skip_all, name = "sts.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                store: "healthy",
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "sts.http", error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    store: "unavailable",
                }),
            )
        }
    }
}

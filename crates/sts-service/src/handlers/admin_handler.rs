//! Operator endpoints, mounted only when `ADMIN_ENDPOINTS_ENABLED` is set.

use crate::errors::StsError;
use crate::handlers::auth_handler::{revocation_duration, RevokeParams};
use crate::models::{CacheStats, ClientDebugInfo};
use crate::routes::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct ClientActionResponse {
    pub client_id: String,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct RateLimitResetResponse {
    pub address: String,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct BlacklistResponse {
    pub blacklisted: bool,
}

/// POST /api/v1/admin/cache/tokens/clear
pub async fn clear_token_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearedResponse>, StsError> {
    let removed = state.service.admin().clear_all_token_state().await?;
    Ok(Json(ClearedResponse { removed }))
}

/// POST /api/v1/admin/cache/clients/clear
pub async fn clear_client_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearedResponse>, StsError> {
    let removed = state.service.admin().clear_all_client_cache_state().await?;
    Ok(Json(ClearedResponse { removed }))
}

/// POST /api/v1/admin/cache/invalidate/client/:client_id
pub async fn invalidate_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Json<ClientActionResponse> {
    let removed = state.service.admin().invalidate_client(&client_id).await;
    Json(ClientActionResponse { client_id, removed })
}

/// POST /api/v1/admin/client/:client_id/revoke-token
///
/// Drops the client's session entry so the next token request mints afresh.
pub async fn revoke_client_session(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Json<ClientActionResponse> {
    let removed = state.service.admin().revoke_client_session(&client_id).await;
    Json(ClientActionResponse { client_id, removed })
}

/// POST /api/v1/admin/tokens/:token/blacklist?duration_seconds=
pub async fn blacklist_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(params): Query<RevokeParams>,
) -> Result<Json<BlacklistResponse>, StsError> {
    let duration = revocation_duration(params.duration_seconds, state.config.max_revocation)?;
    state.service.admin().revoke_token(&token, duration).await?;
    Ok(Json(BlacklistResponse { blacklisted: true }))
}

/// POST /api/v1/admin/rate-limit/:address/reset
pub async fn reset_rate_limit(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Json<RateLimitResetResponse> {
    let removed = state.service.admin().reset_rate_limit(&address).await;
    Json(RateLimitResetResponse { address, removed })
}

/// GET /api/v1/admin/cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.service.admin().cache_stats().await)
}

/// GET /api/v1/admin/debug/cache/:client_id
pub async fn debug_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Json<ClientDebugInfo> {
    Json(state.service.admin().debug_client(&client_id).await)
}

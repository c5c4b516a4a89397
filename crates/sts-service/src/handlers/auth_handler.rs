use crate::errors::StsError;
use crate::models::{TokenResponse, ValidationResult};
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Client-credentials request body. Both fields may instead arrive via
/// HTTP Basic auth.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretString>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevokeParams {
    pub duration_seconds: Option<u64>,
}

/// Handle a client-credentials token request
///
/// POST /api/v1/auth/token
///
/// Credentials are read from HTTP Basic auth when present, otherwise from the
/// JSON body.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenResponse>, StsError> {
    let (client_id, client_secret) = extract_client_credentials(&headers, &body)?;

    let token = state
        .service
        .issue_token(&client_id, client_secret.expose_secret())
        .await?;

    Ok(Json(token))
}

/// Validate the bearer token in the `Authorization` header
///
/// GET /api/v1/auth/validate
///
/// Returns 200 with the validation result when the token is valid and 401
/// with the same body shape when it is not.
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, StsError> {
    let result = state.service.validate_token(authorization(&headers)).await?;

    let status = if result.valid {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json::<ValidationResult>(result)).into_response())
}

/// Revoke the bearer token in the `Authorization` header
///
/// POST /api/v1/auth/revoke?duration_seconds=
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevokeParams>,
    headers: HeaderMap,
) -> Result<StatusCode, StsError> {
    let duration = revocation_duration(params.duration_seconds, state.config.max_revocation)?;

    state
        .service
        .revoke_token(authorization(&headers), duration)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Optional caller-supplied revocation duration, bounded by `1..=max`.
pub(crate) fn revocation_duration(
    seconds: Option<u64>,
    max: Duration,
) -> Result<Option<Duration>, StsError> {
    match seconds {
        None => Ok(None),
        Some(0) => Err(StsError::InvalidRequest(
            "duration_seconds must be positive".to_string(),
        )),
        Some(secs) if secs > max.as_secs() => Err(StsError::InvalidRequest(format!(
            "duration_seconds must not exceed {}",
            max.as_secs()
        ))),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
    }
}

fn authorization(headers: &HeaderMap) -> &str {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
}

/// Extract client credentials from Basic auth or the JSON body.
fn extract_client_credentials(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(String, SecretString), StsError> {
    if let Some(basic) = authorization(headers).trim().strip_prefix("Basic ") {
        let decoded = general_purpose::STANDARD
            .decode(basic.trim())
            .map_err(|_| StsError::InvalidRequest("Malformed Basic credentials".to_string()))?;
        let credentials = String::from_utf8(decoded)
            .map_err(|_| StsError::InvalidRequest("Malformed Basic credentials".to_string()))?;

        return match credentials.split_once(':') {
            Some((id, secret)) if !id.is_empty() => {
                Ok((id.to_string(), SecretString::from(secret.to_string())))
            }
            _ => Err(StsError::InvalidRequest(
                "Malformed Basic credentials".to_string(),
            )),
        };
    }

    let request: TokenRequest = if body.is_empty() {
        TokenRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|_| StsError::InvalidRequest("Malformed request body".to_string()))?
    };

    match (request.client_id, request.client_secret) {
        (Some(id), Some(secret)) if !id.is_empty() => Ok((id, secret)),
        _ => Err(StsError::InvalidRequest(
            "client_id and client_secret are required".to_string(),
        )),
    }
}

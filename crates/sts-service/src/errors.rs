use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Reasons a presented token fails cryptographic verification.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed")]
    Malformed,

    #[error("expired")]
    Expired,

    #[error("signature_invalid")]
    SignatureInvalid,
}

impl TokenError {
    /// Stable label used in validation results and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::Expired => "expired",
            TokenError::SignatureInvalid => "signature_invalid",
        }
    }
}

#[derive(Debug, Error)]
pub enum StsError {
    #[error("Client not found")]
    ClientNotFound,

    #[error("Client is inactive")]
    ClientInactive,

    #[error("Client secret mismatch")]
    CredentialMismatch,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl StsError {
    /// True for the three credential failures, which share one response body.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            StsError::ClientNotFound | StsError::ClientInactive | StsError::CredentialMismatch
        )
    }
}

impl From<StoreError> for StsError {
    fn from(err: StoreError) -> Self {
        StsError::StoreUnavailable(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for StsError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            StsError::ClientNotFound | StsError::ClientInactive | StsError::CredentialMismatch => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CLIENT",
                "Invalid client credentials".to_string(),
            ),
            StsError::MalformedHeader => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Authorization header must carry a Bearer token".to_string(),
            ),
            StsError::InvalidRequest(reason) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", reason.clone())
            }
            StsError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "The shared store is unavailable".to_string(),
            ),
            StsError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "An internal database error occurred".to_string(),
            ),
            StsError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
            ),
            StsError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

//! Bearer token utilities shared by the token service and its callers.
//!
//! This module provides:
//! - The size limit applied to every presented token
//! - `Authorization` header parsing for the `Bearer` scheme
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any parsing (`DoS` prevention)
//! - Error messages are generic; details are logged at debug level only
//! - Token contents are never logged

use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// A minted token with a handful of scopes is ~300 bytes. Anything past this
/// limit is rejected before base64 decoding or signature checks run.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Authorization scheme carried by issued tokens.
pub const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while extracting a bearer token from a header value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BearerError {
    /// Value is empty or does not use the `Bearer` scheme.
    #[error("Authorization header must carry a Bearer token")]
    MissingScheme,

    /// Token exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively (RFC 7235) and surrounding
/// whitespace is ignored.
///
/// # Errors
///
/// - `MissingScheme` - value does not start with `Bearer ` followed by a token
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
///
/// # Example
///
/// ```rust
/// use common::jwt::extract_bearer;
///
/// assert_eq!(extract_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
/// assert!(extract_bearer("Basic dXNlcjpwYXNz").is_err());
/// ```
pub fn extract_bearer(authorization: &str) -> Result<&str, BearerError> {
    let value = authorization.trim();

    let (scheme, rest) = value.split_once(' ').ok_or(BearerError::MissingScheme)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        tracing::debug!(target: "common.jwt", "Authorization value uses a non-bearer scheme");
        return Err(BearerError::MissingScheme);
    }

    // `value` is trimmed, so anything after the first space is non-empty
    let token = rest.trim_start();

    check_token_size(token)?;

    Ok(token)
}

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `BearerError::TokenTooLarge` when the limit is exceeded.
pub fn check_token_size(token: &str) -> Result<(), BearerError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(BearerError::TokenTooLarge);
    }
    Ok(())
}

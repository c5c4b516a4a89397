use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Token type reported in every [`TokenResponse`].
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Machine client registered with the service.
///
/// Owned by the client repository. The token core only reads it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub client_id: String,
    pub display_name: String,
    /// bcrypt hash of the client secret.
    pub secret_hash: String,
    #[serde(default)]
    pub scopes: BTreeSet<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("client_id", &self.client_id)
            .field("display_name", &self.display_name)
            .field("secret_hash", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("active", &self.active)
            .finish()
    }
}

/// Claims embedded in a minted token.
///
/// Timestamps are Unix seconds. The subject is the client id and is
/// redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub subject: String,
    pub display_name: String,
    pub scopes: Vec<String>,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl TokenClaims {
    /// A token is expired at the instant `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Seconds of validity left at `now`, zero once expired.
    pub fn remaining_seconds(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now)).unwrap_or(0)
    }
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("subject", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("scopes", &self.scopes)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Outcome of validating a presented token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub claims: Option<TokenClaims>,
    pub message: String,
}

impl ValidationResult {
    pub const MESSAGE_VALID: &'static str = "valid";
    pub const MESSAGE_REVOKED: &'static str = "revoked";

    pub fn valid(claims: TokenClaims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            message: Self::MESSAGE_VALID.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            message: message.into(),
        }
    }

    pub fn revoked() -> Self {
        Self::invalid(Self::MESSAGE_REVOKED)
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry, measured when the response was built.
    pub expires_in: u64,
    /// Absolute expiry (Unix seconds) taken from the token itself.
    pub expires_at: i64,
}

/// Snapshot of a rate-limit window for one client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub current: u64,
    pub remaining: u64,
    /// Seconds until the window resets, -1 when unknown.
    pub reset_seconds: i64,
}

impl RateLimitInfo {
    pub fn new(limit: u64, current: u64, reset_seconds: i64) -> Self {
        Self {
            limit,
            current,
            remaining: limit.saturating_sub(current),
            reset_seconds,
        }
    }
}

/// Cache statistics reported to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached client records, -1 when the store could not be read.
    pub client_cache_size: i64,
}

/// Read-only view of a client's session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDebugInfo {
    pub client_id: String,
    pub has_valid_token: bool,
    pub checked_at: i64,
}

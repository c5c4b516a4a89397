pub mod codec;

use crate::config::{ConfigError, MAX_BCRYPT_COST, MIN_BCRYPT_COST, MIN_JWT_SECRET_BYTES};
use crate::errors::{StsError, TokenError};
use crate::models::TokenClaims;
use base64::{engine::general_purpose, Engine as _};
use codec::WireClaims;
use common::jwt::check_token_size;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::instrument;

/// bcrypt hash verified when a client id is unknown, so the response time
/// does not reveal whether the client exists.
const DUMMY_BCRYPT_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// HS256 signer holding the process-wide secret.
///
/// Built once at startup and shared. Expiry is checked against the caller's
/// clock with no leeway: a token is expired once `now >= exp`.
pub struct Signer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &"HS256")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Signer {
    /// Build a signer from raw secret bytes.
    ///
    /// # Errors
    ///
    /// `ConfigError::WeakSecret` when the secret is shorter than 32 bytes.
    pub fn new(secret: &[u8]) -> Result<Self, ConfigError> {
        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::WeakSecret(secret.len()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // exp is enforced below against a single clock
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign a claim set. Deterministic for a fixed secret and fixed claims.
    #[instrument(skip_all)]
    pub fn mint(&self, claims: &TokenClaims) -> Result<String, StsError> {
        encode(
            &Header::new(Algorithm::HS256),
            &WireClaims::from(claims),
            &self.encoding_key,
        )
        .map_err(|e| StsError::Crypto(format!("Token signing failed: {}", e)))
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify signature and structure, then expiry relative to `now`.
    ///
    /// The size limit is applied before any decoding.
    #[instrument(skip_all)]
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        if check_token_size(token).is_err() {
            return Err(TokenError::Malformed);
        }

        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                let err = match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::SignatureInvalid
                    }
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                };
                tracing::debug!(target: "sts.crypto", error = %e, reason = err.as_str(), "Token verification failed");
                err
            },
        )?;

        let claims = TokenClaims::from(data.claims);
        if claims.is_expired_at(now) {
            tracing::debug!(
                target: "sts.crypto",
                exp = claims.expires_at,
                now = now,
                "Token rejected: expired"
            );
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Content hash used to key per-token cache entries.
///
/// Standard base64 of the SHA-256 digest of the raw token string.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    general_purpose::STANDARD.encode(digest)
}

/// Hash client secret with bcrypt using a cost in the accepted range.
///
/// # Errors
///
/// Returns `StsError::Crypto` if the cost is outside 10-14 or hashing fails.
#[instrument(skip_all)]
pub fn hash_client_secret(secret: &str, cost: u32) -> Result<String, StsError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(StsError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(secret, cost)
        .map_err(|e| StsError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify client secret against bcrypt hash (constant-time comparison).
#[instrument(skip_all)]
pub fn verify_client_secret(secret: &str, hash: &str) -> Result<bool, StsError> {
    bcrypt::verify(secret, hash)
        .map_err(|e| StsError::Crypto(format!("Password verification failed: {}", e)))
}

/// Burn one bcrypt verification for a client id that does not exist.
#[instrument(skip_all)]
pub fn verify_against_dummy(secret: &str) {
    if let Err(e) = bcrypt::verify(secret, DUMMY_BCRYPT_HASH) {
        tracing::debug!(target: "sts.crypto", error = %e, "Dummy bcrypt verification failed");
    }
}

//! Builder patterns for test tokens
//!
//! Builds HS256 tokens with the service's claim names, for tests that need
//! tokens the issuer would never mint (expired, forged, oversized).

use crate::crypto_fixtures::TEST_JWT_SECRET;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

/// Builder for signed test tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_client("reporting")
///     .with_scopes(&["reports:read"])
///     .expires_in(-60)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    client_name: String,
    scopes: Vec<String>,
    iat: i64,
    exp: i64,
    secret: String,
}

impl TestTokenBuilder {
    /// Create a new builder: one hour of validity, signed with [`TEST_JWT_SECRET`]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            client_name: "Test Client".to_string(),
            scopes: Vec::new(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            secret: TEST_JWT_SECRET.to_string(),
        }
    }

    pub fn for_client(mut self, client_id: &str) -> Self {
        self.sub = client_id.to_string();
        self
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.client_name = name.to_string();
        self
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a different secret
    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// The claim set as JSON
    pub fn build_claims(&self) -> serde_json::Value {
        json!({
            "sub": self.sub,
            "client_name": self.client_name,
            "scopes": self.scopes,
            "iat": self.iat,
            "exp": self.exp,
        })
    }

    /// Sign the claims with HS256
    pub fn build(self) -> String {
        encode(
            &Header::default(),
            &self.build_claims(),
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("HS256 encoding should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sts_service::crypto::Signer;

    #[test]
    fn test_built_token_verifies_with_service_signer() {
        let token = TestTokenBuilder::new()
            .for_client("reporting")
            .with_display_name("Reporting")
            .with_scopes(&["reports:read"])
            .build();

        let signer = Signer::new(TEST_JWT_SECRET.as_bytes()).unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.subject, "reporting");
        assert_eq!(claims.display_name, "Reporting");
        assert_eq!(claims.scopes, vec!["reports:read".to_string()]);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = TestTokenBuilder::new().expires_in(-60).build();

        let signer = Signer::new(TEST_JWT_SECRET.as_bytes()).unwrap();
        assert_eq!(
            signer.verify(&token).unwrap_err().as_str(),
            "expired"
        );
    }
}

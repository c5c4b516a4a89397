//! Custom test assertions for expressive tests
//!
//! Decodes token payloads without verifying signatures; pair with a
//! `/validate` call when the signature matters.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenHeader {
    pub alg: String,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    pub sub: String,
    pub client_name: String,
    pub scopes: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("reporting")
///     .assert_has_scope("reports:read")
///     .assert_expires_in(3600);
/// ```
pub trait TokenAssertions {
    /// Assert three base64url parts, an HS256 header and a decodable payload
    fn assert_valid_jwt(&self) -> &Self;

    fn assert_for_subject(&self, subject: &str) -> &Self;

    fn assert_display_name(&self, name: &str) -> &Self;

    fn assert_has_scope(&self, scope: &str) -> &Self;

    /// Assert the token expires in the future, at most `seconds` from now
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

fn decode_part<T: for<'de> Deserialize<'de>>(token: &str, index: usize) -> T {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("token is missing part {index}"));
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("token part {index} is not base64url: {e}"));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("token part {index} is not the expected JSON: {e}"))
}

fn payload(token: &str) -> TokenPayload {
    decode_part(token, 1)
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "token must have 3 parts (header.payload.signature), got {parts}"
        );

        let header: TokenHeader = decode_part(self, 0);
        assert_eq!(header.alg, "HS256", "expected HS256 algorithm");

        let payload = payload(self);
        assert!(
            payload.iat <= payload.exp,
            "iat ({}) must not be after exp ({})",
            payload.iat,
            payload.exp
        );
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let payload = payload(self);
        assert_eq!(payload.sub, subject, "unexpected token subject");
        self
    }

    fn assert_display_name(&self, name: &str) -> &Self {
        let payload = payload(self);
        assert_eq!(payload.client_name, name, "unexpected client_name claim");
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        let payload = payload(self);
        assert!(
            payload.scopes.iter().any(|s| s == scope),
            "token scopes {:?} do not include {scope:?}",
            payload.scopes
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let payload = payload(self);
        let remaining = payload.exp - chrono::Utc::now().timestamp();
        assert!(
            remaining > 0 && remaining <= seconds,
            "token expires in {remaining}s, expected (0, {seconds}]"
        );
        self
    }
}

//! Mapping between [`TokenClaims`] and the claim set carried on the wire.
//!
//! Wire claims: `sub` (client id), `client_name`, `scopes`, `iat`, `exp`.

use crate::models::TokenClaims;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::jwt::check_token_size;
use serde::{Deserialize, Serialize};

/// Claim set as serialized into the token payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct WireClaims {
    pub sub: String,
    pub client_name: String,
    pub scopes: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl From<&TokenClaims> for WireClaims {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            sub: claims.subject.clone(),
            client_name: claims.display_name.clone(),
            scopes: claims.scopes.clone(),
            iat: claims.issued_at,
            exp: claims.expires_at,
        }
    }
}

impl From<WireClaims> for TokenClaims {
    fn from(wire: WireClaims) -> Self {
        Self {
            subject: wire.sub,
            display_name: wire.client_name,
            scopes: wire.scopes,
            issued_at: wire.iat,
            expires_at: wire.exp,
        }
    }
}

/// Decode the payload of a token WITHOUT checking its signature.
///
/// Diagnostics only. The result must never be used to grant validity.
pub fn peek(token: &str) -> Option<TokenClaims> {
    check_token_size(token).ok()?;

    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let wire: WireClaims = serde_json::from_slice(&bytes).ok()?;
    Some(wire.into())
}

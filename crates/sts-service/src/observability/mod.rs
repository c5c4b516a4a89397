//! Observability for the token service
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and add only safe
//! fields. Fields fall into three groups:
//! - **SAFE**: plaintext (enums, operation names, counts)
//! - **HASHED**: SHA-256 prefix for correlation (client ids, addresses)
//! - **NEVER**: tokens, client secrets, the signing secret

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// Not a security boundary: a one-way tag so log lines about the same
/// client can be joined without storing the identifier.
pub fn hash_for_correlation(value: &str) -> String {
    let result = Sha256::digest(value.as_bytes());
    hex::encode(result.get(..4).unwrap_or_default())
}

/// Short prefix of a token fingerprint, safe for logs.
pub fn fingerprint_prefix(fingerprint: &str) -> &str {
    fingerprint.get(..8).unwrap_or(fingerprint)
}

/// Error categories for metrics labels (bounded cardinality)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credential failures and rate limiting
    Authentication,
    /// Rejected tokens and signing failures
    Cryptographic,
    /// Shared store outages
    Store,
    /// Database and unexpected errors
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Cryptographic => "cryptographic",
            ErrorCategory::Store => "store",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&crate::errors::StsError> for ErrorCategory {
    fn from(err: &crate::errors::StsError) -> Self {
        use crate::errors::StsError;
        match err {
            StsError::ClientNotFound
            | StsError::ClientInactive
            | StsError::CredentialMismatch
            | StsError::MalformedHeader
            | StsError::InvalidRequest(_) => ErrorCategory::Authentication,
            StsError::Crypto(_) => ErrorCategory::Cryptographic,
            StsError::StoreUnavailable(_) => ErrorCategory::Store,
            StsError::Database(_) | StsError::Internal => ErrorCategory::Internal,
        }
    }
}

use crate::cache::{RevocationRegistry, ValidationCache};
use crate::crypto::Signer;
use crate::errors::{StsError, TokenError};
use crate::models::ValidationResult;
use crate::observability::metrics::record_token_validation;
use common::jwt::{extract_bearer, BearerError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Validates presented tokens: revocation, then cache, then signature.
#[derive(Clone)]
pub struct TokenValidator {
    signer: Arc<Signer>,
    validation_cache: ValidationCache,
    revocations: RevocationRegistry,
}

impl TokenValidator {
    pub fn new(
        signer: Arc<Signer>,
        validation_cache: ValidationCache,
        revocations: RevocationRegistry,
    ) -> Self {
        Self {
            signer,
            validation_cache,
            revocations,
        }
    }

    /// Validate an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// `MalformedHeader` when the value does not carry a bearer token. Every
    /// other failure is reported inside the returned [`ValidationResult`].
    #[instrument(skip_all)]
    pub async fn validate(&self, authorization: &str) -> Result<ValidationResult, StsError> {
        match extract_bearer(authorization) {
            Ok(token) => Ok(self.validate_token(token).await),
            Err(BearerError::TokenTooLarge) => {
                record_token_validation("invalid", Some(TokenError::Malformed.as_str()));
                Ok(ValidationResult::invalid(TokenError::Malformed.as_str()))
            }
            Err(BearerError::MissingScheme) => {
                record_token_validation("invalid", Some("header"));
                Err(StsError::MalformedHeader)
            }
        }
    }

    /// Validate a raw token. Never fails: store problems degrade to a live
    /// signature check.
    #[instrument(skip_all)]
    pub async fn validate_token(&self, token: &str) -> ValidationResult {
        if self.revocations.is_revoked(token).await {
            debug!(target: "sts.services.validator", "Token is revoked");
            record_token_validation("invalid", Some(ValidationResult::MESSAGE_REVOKED));
            return ValidationResult::revoked();
        }

        if let Some(cached) = self.validation_cache.get(token).await {
            record_token_validation("valid", None);
            return cached;
        }

        match self.signer.verify(token) {
            Ok(claims) => {
                let result = ValidationResult::valid(claims);
                self.validation_cache.put(token, &result).await;
                record_token_validation("valid", None);
                result
            }
            Err(e) => {
                debug!(target: "sts.services.validator", reason = e.as_str(), "Token rejected");
                record_token_validation("invalid", Some(e.as_str()));
                ValidationResult::invalid(e.as_str())
            }
        }
    }
}

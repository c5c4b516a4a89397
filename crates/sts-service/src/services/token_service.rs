use crate::cache::{ClientCache, ClientSessionIndex, RevocationRegistry, ValidationCache};
use crate::config::{Config, ConfigError};
use crate::crypto::Signer;
use crate::errors::StsError;
use crate::models::{RateLimitInfo, TokenResponse, ValidationResult};
use crate::repositories::ClientRepository;
use crate::services::admin_service::AdminService;
use crate::services::rate_limiter::RateLimiter;
use crate::services::token_issuer::TokenIssuer;
use crate::services::token_validator::TokenValidator;
use crate::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for the HTTP layer: wires every component over one store.
#[derive(Clone)]
pub struct TokenService {
    issuer: TokenIssuer,
    validator: TokenValidator,
    rate_limiter: RateLimiter,
    admin: AdminService,
}

impl TokenService {
    /// Build every component from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WeakSecret` when the signing secret is too short.
    pub fn new(
        config: &Config,
        store: Arc<dyn SharedStore>,
        repository: Arc<dyn ClientRepository>,
    ) -> Result<Self, ConfigError> {
        let signer = Arc::new(Signer::new(config.jwt_secret_bytes())?);

        let validation_cache = ValidationCache::new(
            store.clone(),
            config.token_cache_ttl,
            config.token_cache_enabled,
        );
        let revocations = RevocationRegistry::new(store.clone(), validation_cache.clone());
        // Session reuse depends on the validation cache
        let sessions = ClientSessionIndex::new(store.clone(), config.token_cache_enabled);
        let client_cache = ClientCache::new(
            store.clone(),
            config.client_cache_ttl,
            config.client_cache_enabled,
        );
        let rate_limiter = RateLimiter::new(
            store,
            config.rate_limit_requests,
            config.rate_limit_window,
            config.rate_limit_enabled,
        );

        let issuer = TokenIssuer::new(
            signer.clone(),
            repository,
            client_cache.clone(),
            sessions.clone(),
            validation_cache.clone(),
            revocations.clone(),
            config.token_validity,
        );
        let validator =
            TokenValidator::new(signer, validation_cache.clone(), revocations.clone());
        let admin = AdminService::new(
            validation_cache,
            revocations,
            sessions,
            client_cache,
            rate_limiter.clone(),
            config.default_revocation,
        );

        Ok(Self {
            issuer,
            validator,
            rate_limiter,
            admin,
        })
    }

    pub async fn issue_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse, StsError> {
        self.issuer.authenticate(client_id, client_secret).await
    }

    /// Validate an `Authorization` header value.
    pub async fn validate_token(&self, authorization: &str) -> Result<ValidationResult, StsError> {
        self.validator.validate(authorization).await
    }

    /// Revoke the bearer token carried by an `Authorization` header value.
    pub async fn revoke_token(
        &self,
        authorization: &str,
        duration: Option<Duration>,
    ) -> Result<(), StsError> {
        let token = common::jwt::extract_bearer(authorization).map_err(|_| StsError::MalformedHeader)?;
        self.admin.revoke_token(token, duration).await
    }

    pub async fn is_rate_limited(&self, address: &str) -> bool {
        self.rate_limiter.is_limited(address).await
    }

    pub async fn rate_limit_info(&self, address: &str) -> RateLimitInfo {
        self.rate_limiter.info(address).await
    }

    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limiter.is_enabled()
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }
}

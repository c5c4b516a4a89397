use crate::cache::{ClientCache, ClientSessionIndex, RevocationRegistry, ValidationCache};
use crate::crypto::{self, Signer};
use crate::errors::StsError;
use crate::models::{ClientIdentity, TokenClaims, TokenResponse, ValidationResult, TOKEN_TYPE_BEARER};
use crate::observability::{hash_for_correlation, metrics::record_token_issuance, ErrorCategory};
use crate::repositories::ClientRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Attempts at minting a token that is not already revoked.
///
/// Minting is deterministic, so re-issuing within the same second as a
/// revoked token reproduces it; each retry shifts the timestamps by a second.
const MAX_MINT_ATTEMPTS: i64 = 3;

/// Issues tokens for the client-credentials grant, reusing a client's
/// current token while it is still valid.
#[derive(Clone)]
pub struct TokenIssuer {
    signer: Arc<Signer>,
    repository: Arc<dyn ClientRepository>,
    client_cache: ClientCache,
    sessions: ClientSessionIndex,
    validation_cache: ValidationCache,
    revocations: RevocationRegistry,
    token_validity: Duration,
}

impl TokenIssuer {
    pub fn new(
        signer: Arc<Signer>,
        repository: Arc<dyn ClientRepository>,
        client_cache: ClientCache,
        sessions: ClientSessionIndex,
        validation_cache: ValidationCache,
        revocations: RevocationRegistry,
        token_validity: Duration,
    ) -> Self {
        Self {
            signer,
            repository,
            client_cache,
            sessions,
            validation_cache,
            revocations,
            token_validity,
        }
    }

    /// Verify client credentials and return a usable token.
    ///
    /// # Errors
    ///
    /// - `ClientNotFound`, `ClientInactive`, `CredentialMismatch` for credential failures
    /// - `Database` when the client record cannot be loaded
    /// - `Crypto` when signing or hash verification fails
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse, StsError> {
        let start = Instant::now();
        let result = self.issue_or_reuse(client_id, client_secret).await;

        let outcome = match &result {
            Ok((_, true)) => "reused",
            Ok((_, false)) => "issued",
            Err(e) if e.is_credential_failure() => "rejected",
            Err(_) => "error",
        };
        record_token_issuance(outcome, start.elapsed());

        if let Err(e) = &result {
            warn!(
                target: "sts.services.issuer",
                error = %e,
                category = ErrorCategory::from(e).as_str(),
                "Token request failed"
            );
        }

        result.map(|(response, _)| response)
    }

    /// Returns the response and whether an existing token was reused.
    async fn issue_or_reuse(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(TokenResponse, bool), StsError> {
        let client = self.resolve_client(client_id).await?;
        Self::check_credentials(client.as_ref(), client_secret)?;
        // check_credentials rejects a missing client
        let client = client.ok_or(StsError::ClientNotFound)?;

        let now = Utc::now().timestamp();

        if let Some((token, claims)) = self.reusable_token(client_id).await {
            debug!(target: "sts.services.issuer", "Reusing current token");
            return Ok((Self::response(token, &claims, now), true));
        }

        let (token, claims) = self.mint_for(&client, now).await?;
        info!(
            target: "sts.services.issuer",
            expires_at = claims.expires_at,
            "Issued new token"
        );
        Ok((Self::response(token, &claims, now), false))
    }

    /// Client record, cache first, repository on miss.
    async fn resolve_client(&self, client_id: &str) -> Result<Option<ClientIdentity>, StsError> {
        if let Some(client) = self.client_cache.get(client_id).await {
            return Ok(Some(client));
        }

        let client = self.repository.find_by_client_id(client_id).await?;
        if let Some(client) = &client {
            self.client_cache.put(client).await;
        }
        Ok(client)
    }

    /// A bcrypt verification runs for every request, including unknown clients.
    fn check_credentials(client: Option<&ClientIdentity>, secret: &str) -> Result<(), StsError> {
        let Some(client) = client else {
            crypto::verify_against_dummy(secret);
            return Err(StsError::ClientNotFound);
        };

        let secret_matches = crypto::verify_client_secret(secret, &client.secret_hash)?;

        if !client.active {
            return Err(StsError::ClientInactive);
        }
        if !secret_matches {
            return Err(StsError::CredentialMismatch);
        }
        Ok(())
    }

    /// The client's current token, if it is unrevoked and cached as valid.
    ///
    /// A stale session entry is dropped together with its validation entry.
    async fn reusable_token(&self, client_id: &str) -> Option<(String, TokenClaims)> {
        let token = self.sessions.current_token(client_id).await?;

        if !self.revocations.is_revoked(&token).await {
            let claims = self
                .validation_cache
                .get(&token)
                .await
                .and_then(|result| result.claims)
                .filter(|claims| claims.subject == client_id);
            if let Some(claims) = claims {
                return Some((token, claims));
            }
        }

        debug!(target: "sts.services.issuer", "Dropping stale session entry");
        self.sessions.remove(client_id).await;
        self.validation_cache.evict(&token).await;
        None
    }

    async fn mint_for(
        &self,
        client: &ClientIdentity,
        now: i64,
    ) -> Result<(String, TokenClaims), StsError> {
        let validity = i64::try_from(self.token_validity.as_secs()).map_err(|_| StsError::Internal)?;

        let mut minted = None;
        for shift in 0..MAX_MINT_ATTEMPTS {
            let claims = TokenClaims {
                subject: client.client_id.clone(),
                display_name: client.display_name.clone(),
                scopes: client.scopes.iter().cloned().collect(),
                issued_at: now + shift,
                expires_at: now + shift + validity,
            };
            let token = self.signer.mint(&claims)?;
            if !self.revocations.is_revoked(&token).await {
                minted = Some((token, claims));
                break;
            }
        }
        let (token, claims) = minted.ok_or_else(|| {
            StsError::Crypto("could not mint an unrevoked token".to_string())
        })?;

        let ttl = Duration::from_secs(claims.remaining_seconds(now));
        self.sessions.record(&client.client_id, &token, ttl).await;
        // Seed the cache so the next request can reuse this token
        self.validation_cache
            .put(&token, &ValidationResult::valid(claims.clone()))
            .await;

        Ok((token, claims))
    }

    fn response(token: String, claims: &TokenClaims, now: i64) -> TokenResponse {
        TokenResponse {
            access_token: token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: claims.remaining_seconds(now),
            expires_at: claims.expires_at,
        }
    }
}

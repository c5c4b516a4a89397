use crate::cache::{ClientCache, ClientSessionIndex, RevocationRegistry, ValidationCache};
use crate::crypto::codec;
use crate::errors::StsError;
use crate::models::{CacheStats, ClientDebugInfo};
use crate::observability::{hash_for_correlation, metrics::record_admin_operation};
use crate::services::rate_limiter::RateLimiter;
use std::time::Duration;
use tracing::{info, instrument};

/// Operator actions over the cache keyspaces.
#[derive(Clone)]
pub struct AdminService {
    validation_cache: ValidationCache,
    revocations: RevocationRegistry,
    sessions: ClientSessionIndex,
    client_cache: ClientCache,
    rate_limiter: RateLimiter,
    default_revocation: Duration,
}

impl AdminService {
    pub fn new(
        validation_cache: ValidationCache,
        revocations: RevocationRegistry,
        sessions: ClientSessionIndex,
        client_cache: ClientCache,
        rate_limiter: RateLimiter,
        default_revocation: Duration,
    ) -> Self {
        Self {
            validation_cache,
            revocations,
            sessions,
            client_cache,
            rate_limiter,
            default_revocation,
        }
    }

    /// Drop every validation result, blacklist marker and session entry.
    ///
    /// Clearing the blacklist makes revoked tokens valid again until they
    /// expire. Returns the number of keys removed.
    #[instrument(skip_all)]
    pub async fn clear_all_token_state(&self) -> Result<u64, StsError> {
        record_admin_operation("clear_token_state");
        let removed = self.validation_cache.clear_all().await?
            + self.revocations.clear_all().await?
            + self.sessions.clear_all().await?;
        info!(target: "sts.services.admin", removed = removed, "Cleared token state");
        Ok(removed)
    }

    #[instrument(skip_all)]
    pub async fn clear_all_client_cache_state(&self) -> Result<u64, StsError> {
        record_admin_operation("clear_client_cache");
        let removed = self.client_cache.clear_all().await?;
        info!(target: "sts.services.admin", removed = removed, "Cleared client cache");
        Ok(removed)
    }

    /// Forget a client: its cached record, its current token's validation
    /// entry and its session entry. Returns true when anything was removed.
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn invalidate_client(&self, client_id: &str) -> bool {
        record_admin_operation("invalidate_client");
        let record_removed = self.client_cache.invalidate(client_id).await;

        if let Some(token) = self.sessions.current_token(client_id).await {
            self.validation_cache.evict(&token).await;
        }
        let session_removed = self.sessions.remove(client_id).await;

        info!(
            target: "sts.services.admin",
            record_removed = record_removed,
            session_removed = session_removed,
            "Invalidated client"
        );
        record_removed || session_removed
    }

    /// Remove only the client's session entry, forcing a fresh mint on the
    /// next token request. The previous token stays valid.
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn revoke_client_session(&self, client_id: &str) -> bool {
        record_admin_operation("revoke_client_session");
        self.sessions.remove(client_id).await
    }

    /// Blacklist a token for `duration`, or the configured default.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` when the blacklist marker could not be written.
    #[instrument(skip_all)]
    pub async fn revoke_token(&self, token: &str, duration: Option<Duration>) -> Result<(), StsError> {
        record_admin_operation("revoke_token");
        let duration = duration.unwrap_or(self.default_revocation);
        if self.revocations.revoke(token, duration).await {
            // Unverified decode, for the log line only
            let client = codec::peek(token)
                .map(|claims| hash_for_correlation(&claims.subject))
                .unwrap_or_default();
            info!(target: "sts.services.admin", client = %client, "Blacklisted token");
            Ok(())
        } else {
            Err(StsError::StoreUnavailable(
                "revocation marker was not written".to_string(),
            ))
        }
    }

    #[instrument(skip_all, fields(address = %hash_for_correlation(address)))]
    pub async fn reset_rate_limit(&self, address: &str) -> bool {
        record_admin_operation("reset_rate_limit");
        self.rate_limiter.reset(address).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        record_admin_operation("cache_stats");
        CacheStats {
            client_cache_size: self.client_cache.size().await,
        }
    }

    /// Whether the client currently holds a reusable token. Never mutates
    /// the store.
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn debug_client(&self, client_id: &str) -> ClientDebugInfo {
        record_admin_operation("debug_client");
        let has_valid_token = match self.sessions.current_token(client_id).await {
            Some(token) => {
                !self.revocations.is_revoked(&token).await
                    && self
                        .validation_cache
                        .peek(&token)
                        .await
                        .and_then(|r| r.claims)
                        .is_some_and(|c| c.subject == client_id)
            }
            None => false,
        };

        ClientDebugInfo {
            client_id: client_id.to_string(),
            has_valid_token,
            checked_at: chrono::Utc::now().timestamp(),
        }
    }
}

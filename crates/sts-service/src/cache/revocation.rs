//! Token blacklist, keyed by token fingerprint.
//!
//! Revoking a token also evicts it from the [`ValidationCache`], so a
//! revoked token is never served from a cached "valid" entry.

use super::{clear_namespace, store_failure, ValidationCache, TOKEN_BLACKLIST_PREFIX};
use crate::crypto::token_fingerprint;
use crate::observability::fingerprint_prefix;
use crate::store::{SharedStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

const CACHE_NAME: &str = "blacklist";

/// Value stored under each blacklist key.
const REVOKED_MARKER: &str = "revoked";

#[derive(Clone)]
pub struct RevocationRegistry {
    store: Arc<dyn SharedStore>,
    validation_cache: ValidationCache,
}

impl RevocationRegistry {
    pub fn new(store: Arc<dyn SharedStore>, validation_cache: ValidationCache) -> Self {
        Self {
            store,
            validation_cache,
        }
    }

    pub fn key(token: &str) -> String {
        format!("{TOKEN_BLACKLIST_PREFIX}{}", token_fingerprint(token))
    }

    /// Mark `token` revoked for `duration` and evict it from the validation
    /// cache. Returns false when the marker could not be written.
    #[instrument(skip_all, fields(duration_secs = duration.as_secs()))]
    pub async fn revoke(&self, token: &str, duration: Duration) -> bool {
        let key = Self::key(token);
        let written = match self.store.set(&key, REVOKED_MARKER, duration).await {
            Ok(()) => true,
            Err(e) => {
                store_failure(CACHE_NAME, "set", &e);
                false
            }
        };

        self.validation_cache.evict(token).await;

        if written {
            info!(
                target: "sts.cache.revocation",
                token = fingerprint_prefix(&token_fingerprint(token)),
                duration_secs = duration.as_secs(),
                "Token revoked"
            );
        }
        written
    }

    /// Whether `token` is currently revoked. Store failures read as "not revoked".
    #[instrument(skip_all)]
    pub async fn is_revoked(&self, token: &str) -> bool {
        match self.store.exists(&Self::key(token)).await {
            Ok(revoked) => revoked,
            Err(e) => {
                store_failure(CACHE_NAME, "exists", &e);
                false
            }
        }
    }

    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        clear_namespace(self.store.as_ref(), CACHE_NAME, TOKEN_BLACKLIST_PREFIX).await
    }
}

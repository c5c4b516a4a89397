//! Memoized successful validation results, keyed by token fingerprint.
//!
//! An entry's TTL never exceeds the remaining lifetime of its token, and an
//! entry whose token has logically expired is treated as absent and evicted
//! even if the store has not expired it yet.

use super::{clear_namespace, store_failure, TOKEN_CACHE_PREFIX};
use crate::crypto::token_fingerprint;
use crate::models::ValidationResult;
use crate::observability::{fingerprint_prefix, metrics::record_cache_lookup};
use crate::store::{SharedStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const CACHE_NAME: &str = "validation";

#[derive(Clone)]
pub struct ValidationCache {
    store: Arc<dyn SharedStore>,
    default_ttl: Duration,
    enabled: bool,
}

impl ValidationCache {
    pub fn new(store: Arc<dyn SharedStore>, default_ttl: Duration, enabled: bool) -> Self {
        Self {
            store,
            default_ttl,
            enabled,
        }
    }

    pub fn key(token: &str) -> String {
        format!("{TOKEN_CACHE_PREFIX}{}", token_fingerprint(token))
    }

    /// Cached result for `token`, if present, valid and not logically expired.
    #[instrument(skip_all)]
    pub async fn get(&self, token: &str) -> Option<ValidationResult> {
        if !self.enabled {
            return None;
        }

        let key = Self::key(token);
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                store_failure(CACHE_NAME, "get", &e);
                return None;
            }
        };

        let Some(raw) = raw else {
            record_cache_lookup(CACHE_NAME, false);
            return None;
        };

        let now = chrono::Utc::now().timestamp();
        let usable = serde_json::from_str::<ValidationResult>(&raw)
            .ok()
            .filter(|r| r.valid)
            .filter(|r| r.claims.as_ref().is_some_and(|c| !c.is_expired_at(now)));

        match usable {
            Some(result) => {
                record_cache_lookup(CACHE_NAME, true);
                Some(result)
            }
            None => {
                debug!(
                    target: "sts.cache.validation",
                    key = fingerprint_prefix(key.strip_prefix(TOKEN_CACHE_PREFIX).unwrap_or(&key)),
                    "Evicting stale validation entry"
                );
                record_cache_lookup(CACHE_NAME, false);
                self.delete_key(&key).await;
                None
            }
        }
    }

    /// Read-only lookup: no eviction and no lookup metric.
    pub async fn peek(&self, token: &str) -> Option<ValidationResult> {
        if !self.enabled {
            return None;
        }
        let raw = self.store.get(&Self::key(token)).await.ok().flatten()?;
        let now = chrono::Utc::now().timestamp();
        serde_json::from_str::<ValidationResult>(&raw)
            .ok()
            .filter(|r| r.valid && r.claims.as_ref().is_some_and(|c| !c.is_expired_at(now)))
    }

    /// Cache a successful result with TTL `min(default_ttl, expires_at - now)`.
    ///
    /// Invalid results and tokens with no remaining lifetime are not cached.
    #[instrument(skip_all)]
    pub async fn put(&self, token: &str, result: &ValidationResult) {
        if !self.enabled || !result.valid {
            return;
        }
        let Some(claims) = result.claims.as_ref() else {
            return;
        };

        // Whole-second clock: the key may outlive `exp` by under a second;
        // `get` rejects the entry by its claims in that gap.
        let remaining = claims.remaining_seconds(chrono::Utc::now().timestamp());
        if remaining == 0 {
            return;
        }
        let ttl = self.default_ttl.min(Duration::from_secs(remaining));

        let value = match serde_json::to_string(result) {
            Ok(v) => v,
            Err(e) => {
                store_failure(CACHE_NAME, "serialize", &StoreError::Serialization(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.store.set(&Self::key(token), &value, ttl).await {
            store_failure(CACHE_NAME, "set", &e);
        }
    }

    /// Remove the cached result for `token`, if any.
    pub async fn evict(&self, token: &str) {
        if self.enabled {
            self.delete_key(&Self::key(token)).await;
        }
    }

    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        clear_namespace(self.store.as_ref(), CACHE_NAME, TOKEN_CACHE_PREFIX).await
    }

    async fn delete_key(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            store_failure(CACHE_NAME, "delete", &e);
        }
    }
}

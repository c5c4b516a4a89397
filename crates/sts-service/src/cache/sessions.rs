//! Client id to current token mapping, used to reuse a still-valid token.
//!
//! A client maps to at most one token; recording a new one overwrites it.

use super::{clear_namespace, store_failure, CLIENT_TOKEN_PREFIX};
use crate::observability::hash_for_correlation;
use crate::store::{SharedStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const CACHE_NAME: &str = "session";

#[derive(Clone)]
pub struct ClientSessionIndex {
    store: Arc<dyn SharedStore>,
    enabled: bool,
}

impl ClientSessionIndex {
    pub fn new(store: Arc<dyn SharedStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn key(client_id: &str) -> String {
        format!("{CLIENT_TOKEN_PREFIX}{client_id}")
    }

    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn current_token(&self, client_id: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match self.store.get(&Self::key(client_id)).await {
            Ok(token) => token,
            Err(e) => {
                store_failure(CACHE_NAME, "get", &e);
                None
            }
        }
    }

    /// Record `token` as the client's current token for `ttl`.
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn record(&self, client_id: &str, token: &str, ttl: Duration) {
        if !self.enabled || ttl.is_zero() {
            return;
        }
        if let Err(e) = self.store.set(&Self::key(client_id), token, ttl).await {
            store_failure(CACHE_NAME, "set", &e);
        }
    }

    /// Drop the client's session entry. Returns true when one existed.
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn remove(&self, client_id: &str) -> bool {
        match self.store.delete(&Self::key(client_id)).await {
            Ok(existed) => {
                debug!(target: "sts.cache.sessions", existed = existed, "Session entry removed");
                existed
            }
            Err(e) => {
                store_failure(CACHE_NAME, "delete", &e);
                false
            }
        }
    }

    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        clear_namespace(self.store.as_ref(), CACHE_NAME, CLIENT_TOKEN_PREFIX).await
    }
}

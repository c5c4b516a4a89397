//! Cache-through store for client records.

use super::{clear_namespace, store_failure, CLIENT_CACHE_PREFIX};
use crate::models::ClientIdentity;
use crate::observability::{hash_for_correlation, metrics::record_cache_lookup};
use crate::store::{SharedStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const CACHE_NAME: &str = "client";

#[derive(Clone)]
pub struct ClientCache {
    store: Arc<dyn SharedStore>,
    ttl: Duration,
    enabled: bool,
}

impl ClientCache {
    pub fn new(store: Arc<dyn SharedStore>, ttl: Duration, enabled: bool) -> Self {
        Self {
            store,
            ttl,
            enabled,
        }
    }

    pub fn key(client_id: &str) -> String {
        format!("{CLIENT_CACHE_PREFIX}{client_id}")
    }

    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn get(&self, client_id: &str) -> Option<ClientIdentity> {
        if !self.enabled {
            return None;
        }

        let raw = match self.store.get(&Self::key(client_id)).await {
            Ok(raw) => raw,
            Err(e) => {
                store_failure(CACHE_NAME, "get", &e);
                return None;
            }
        };

        let client = raw.and_then(|raw| match serde_json::from_str::<ClientIdentity>(&raw) {
            Ok(client) => Some(client),
            Err(e) => {
                debug!(target: "sts.cache.clients", error = %e, "Discarding unreadable client entry");
                None
            }
        });
        record_cache_lookup(CACHE_NAME, client.is_some());
        client
    }

    #[instrument(skip_all, fields(client = %hash_for_correlation(&client.client_id)))]
    pub async fn put(&self, client: &ClientIdentity) {
        if !self.enabled {
            return;
        }

        let value = match serde_json::to_string(client) {
            Ok(v) => v,
            Err(e) => {
                store_failure(CACHE_NAME, "serialize", &StoreError::Serialization(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.store.set(&Self::key(&client.client_id), &value, self.ttl).await {
            store_failure(CACHE_NAME, "set", &e);
        }
    }

    /// Drop the cached record. Returns true when one existed.
    #[instrument(skip_all, fields(client = %hash_for_correlation(client_id)))]
    pub async fn invalidate(&self, client_id: &str) -> bool {
        match self.store.delete(&Self::key(client_id)).await {
            Ok(existed) => existed,
            Err(e) => {
                store_failure(CACHE_NAME, "delete", &e);
                false
            }
        }
    }

    /// Replace the cached record with a fresh copy.
    pub async fn refresh(&self, client: &ClientIdentity) {
        self.invalidate(&client.client_id).await;
        self.put(client).await;
    }

    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        clear_namespace(self.store.as_ref(), CACHE_NAME, CLIENT_CACHE_PREFIX).await
    }

    /// Number of cached client records, -1 when the store cannot be read.
    pub async fn size(&self) -> i64 {
        match self.store.keys(&format!("{CLIENT_CACHE_PREFIX}*")).await {
            Ok(keys) => i64::try_from(keys.len()).unwrap_or(i64::MAX),
            Err(e) => {
                store_failure(CACHE_NAME, "scan", &e);
                -1
            }
        }
    }
}

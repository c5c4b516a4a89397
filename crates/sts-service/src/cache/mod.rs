//! Keyspace wrappers over the [`SharedStore`].
//!
//! Each wrapper owns one key prefix and recovers from store failures
//! locally: reads become misses, writes are skipped, and the failure is
//! logged at `warn` and counted.

pub mod clients;
pub mod revocation;
pub mod sessions;
pub mod validation;

pub use clients::ClientCache;
pub use revocation::RevocationRegistry;
pub use sessions::ClientSessionIndex;
pub use validation::ValidationCache;

use crate::observability::metrics::record_store_error;
use crate::store::{SharedStore, StoreError};

pub const TOKEN_CACHE_PREFIX: &str = "token_cache:";
pub const TOKEN_BLACKLIST_PREFIX: &str = "token_blacklist:";
pub const CLIENT_TOKEN_PREFIX: &str = "client_token:";
pub const RATE_LIMIT_PREFIX: &str = "rate_limit:";
pub const CLIENT_CACHE_PREFIX: &str = "client_cache:";

/// Log and count a store failure that the caller is about to swallow.
pub(crate) fn store_failure(target_cache: &'static str, operation: &'static str, err: &StoreError) {
    tracing::warn!(
        target: "sts.store",
        cache = target_cache,
        operation = operation,
        error = %err,
        "Store operation failed; continuing without cache"
    );
    record_store_error(operation);
}

/// Delete every key under `prefix`. Returns the number of keys removed.
pub(crate) async fn clear_namespace(
    store: &dyn SharedStore,
    cache: &'static str,
    prefix: &str,
) -> Result<u64, StoreError> {
    let keys = store.keys(&format!("{prefix}*")).await.map_err(|e| {
        store_failure(cache, "scan", &e);
        e
    })?;

    let removed = store.delete_many(&keys).await.map_err(|e| {
        store_failure(cache, "delete_many", &e);
        e
    })?;

    tracing::info!(target: "sts.store", cache = cache, removed = removed, "Cleared namespace");
    Ok(removed)
}

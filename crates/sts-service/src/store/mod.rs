//! Shared key-value store used by every cache keyspace.
//!
//! # Key Patterns
//!
//! - `token_cache:{fingerprint}` - cached validation result (JSON)
//! - `token_blacklist:{fingerprint}` - revocation sentinel
//! - `client_token:{client_id}` - client's current token
//! - `rate_limit:{address}` - fixed-window request counter
//! - `client_cache:{client_id}` - cached client record (JSON)
//!
//! Every operation may fail transiently. Callers in the keyspace wrappers
//! recover locally (reads become misses, writes are skipped).

pub mod lua_scripts;
pub mod memory;
pub mod redis;

pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out: {0}")]
    Timeout(&'static str),

    #[error("Store value could not be (de)serialized: {0}")]
    Serialization(String),

    #[error("TTL of {0}s exceeds the store maximum")]
    InvalidTtl(u64),
}

/// Longest expiry any keyspace may request (one year).
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// TTL-capable key-value store.
#[async_trait::async_trait]
pub trait SharedStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, expiring after `ttl` (whole seconds, at least one).
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Returns true when the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete several keys, returning how many existed.
    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Keys matching a glob pattern where `*` matches any run of characters.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Remaining lifetime of a key. `None` when the key is missing or has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Atomically increment a counter, starting a `window`-long expiry when the
    /// counter is created. Returns the new count.
    async fn increment_with_expiry(&self, key: &str, window: Duration) -> Result<u64, StoreError>;

    /// Round trip used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Store TTLs are whole seconds; sub-second values round up to one second.
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs.max(1)
    }
}

/// [`ttl_seconds`], rejecting values above [`MAX_TTL_SECONDS`].
pub(crate) fn checked_ttl_seconds(ttl: Duration) -> Result<u64, StoreError> {
    let secs = ttl_seconds(ttl);
    if secs > MAX_TTL_SECONDS {
        return Err(StoreError::InvalidTtl(secs));
    }
    Ok(secs)
}

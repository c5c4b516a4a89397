//! Redis-backed [`SharedStore`].
//!
//! # Connection Pattern
//!
//! `ConnectionManager` wraps a multiplexed connection and reconnects on
//! failure. It is cheap to clone and safe to use concurrently, so every
//! operation clones it instead of locking.
//!
//! Every round trip is bounded by the configured store timeout.

use super::{checked_ttl_seconds, lua_scripts, SharedStore, StoreError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Keys requested per SCAN round trip.
const SCAN_BATCH_SIZE: usize = 100;

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    timeout: Duration,
    increment_script: Script,
}

impl RedisStore {
    /// Connect to Redis and verify the server answers.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the URL is invalid or the server
    /// cannot be reached.
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|e| {
            // The URL may carry credentials (redis://:password@host:port)
            error!(target: "sts.store", error = %e, "Failed to open Redis client");
            StoreError::Unavailable(format!("Failed to open Redis client: {e}"))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            error!(target: "sts.store", error = %e, "Failed to connect to Redis");
            StoreError::Unavailable(format!("Failed to connect to Redis: {e}"))
        })?;

        let store = Self {
            connection,
            timeout,
            increment_script: Script::new(lua_scripts::INCREMENT_WITH_EXPIRY),
        };
        store.ping().await?;

        debug!(target: "sts.store", "Redis connection established");
        Ok(store)
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(target: "sts.store", operation = op, error = %e, "Redis operation failed");
                Err(StoreError::Unavailable(format!("{op}: {e}")))
            }
            Err(_) => {
                warn!(
                    target: "sts.store",
                    operation = op,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Redis operation timed out"
                );
                Err(StoreError::Timeout(op))
            }
        }
    }
}

#[async_trait::async_trait]
impl SharedStore for RedisStore {
    #[instrument(skip_all)]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        self.bounded("get", conn.get::<_, Option<String>>(key)).await
    }

    #[instrument(skip_all)]
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let seconds = checked_ttl_seconds(ttl)?;
        let mut conn = self.connection.clone();
        self.bounded("set", conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
    }

    #[instrument(skip_all)]
    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let removed = self.bounded("delete", conn.del::<_, u64>(key)).await?;
        Ok(removed > 0)
    }

    #[instrument(skip_all, fields(count = keys.len()))]
    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        self.bounded("delete_many", conn.del::<_, u64>(keys)).await
    }

    #[instrument(skip_all)]
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        self.bounded("exists", conn.exists::<_, bool>(key)).await
    }

    /// Pattern scan with SCAN MATCH; never issues KEYS.
    #[instrument(skip_all)]
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut found = Vec::new();

        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE);

            let (next, batch): (u64, Vec<String>) =
                self.bounded("scan", cmd.query_async(&mut conn)).await?;
            found.extend(batch);

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(found)
    }

    #[instrument(skip_all)]
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.connection.clone();
        // -2: missing key, -1: no expiry
        let secs = self.bounded("ttl", conn.ttl::<_, i64>(key)).await?;
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    #[instrument(skip_all)]
    async fn increment_with_expiry(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let seconds = checked_ttl_seconds(window)?;
        let mut conn = self.connection.clone();
        let mut invocation = self.increment_script.key(key);
        invocation.arg(seconds);

        let count: i64 = self
            .bounded("increment_with_expiry", invocation.invoke_async(&mut conn))
            .await?;

        u64::try_from(count).map_err(|_| {
            error!(target: "sts.store", count = count, "Counter returned a negative value");
            StoreError::Serialization(format!("invalid counter value {count}"))
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: String = self
            .bounded("ping", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}

//! In-process [`SharedStore`] for tests and single-instance development.
//!
//! Expiry uses `tokio::time::Instant`, so tests can drive windows with a
//! paused clock. `set_unavailable(true)` makes every call fail, which is how
//! the fail-open paths are exercised without a real outage.

use super::{checked_ttl_seconds, SharedStore, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
}

/// Cheaply cloneable; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle injected failures for every subsequent call.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Entries map with expired keys already dropped.
    async fn live_entries(&self) -> tokio::sync::MutexGuard<'_, HashMap<String, Entry>> {
        let mut entries = self.inner.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        entries
    }
}

fn expiry(ttl: Duration) -> Result<Instant, StoreError> {
    let seconds = checked_ttl_seconds(ttl)?;
    Instant::now()
        .checked_add(Duration::from_secs(seconds))
        .ok_or(StoreError::InvalidTtl(seconds))
}

/// Glob match where `*` matches any (possibly empty) run of characters.
fn glob_match(pattern: &str, key: &str) -> bool {
    let mut segments = pattern.split('*');
    let Some(first) = segments.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        // no `*` in the pattern
        return rest.is_empty();
    };

    for segment in middle {
        match rest.find(segment) {
            Some(pos) => rest = rest.get(pos + segment.len()..).unwrap_or_default(),
            None => return false,
        }
    }

    rest.ends_with(last)
}

#[async_trait::async_trait]
impl SharedStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let entries = self.live_entries().await;
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        let expires_at = expiry(ttl)?;
        let mut entries = self.live_entries().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut entries = self.live_entries().await;
        Ok(entries.remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut entries = self.live_entries().await;
        let removed = keys.iter().filter(|k| entries.remove(*k).is_some()).count();
        Ok(removed as u64)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let entries = self.live_entries().await;
        Ok(entries.contains_key(key))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let entries = self.live_entries().await;
        Ok(entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.check_available()?;
        let entries = self.live_entries().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn increment_with_expiry(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        self.check_available()?;
        let expires_at = expiry(window)?;
        let mut entries = self.live_entries().await;

        match entries.get_mut(key) {
            Some(entry) => {
                let count = entry
                    .value
                    .parse::<u64>()
                    .map_err(|e| StoreError::Serialization(format!("counter {key}: {e}")))?
                    .saturating_add(1);
                entry.value = count.to_string();
                if entry.expires_at.is_none() {
                    entry.expires_at = Some(expires_at);
                }
                Ok(count)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: Some(expires_at),
                    },
                );
                Ok(1)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

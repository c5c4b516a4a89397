use crate::cache::{store_failure, RATE_LIMIT_PREFIX};
use crate::models::RateLimitInfo;
use crate::observability::{hash_for_correlation, metrics::record_rate_limit_decision};
use crate::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const CACHE_NAME: &str = "rate_limit";

/// Fixed-window request counter per client address.
///
/// Every request increments the window counter; a request is limited once
/// the count exceeds the limit. Bursts straddling a window boundary may
/// admit up to twice the limit. Store failures never limit a request.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SharedStore>,
    limit: u64,
    window: Duration,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SharedStore>, limit: u64, window: Duration, enabled: bool) -> Self {
        Self {
            store,
            limit,
            window,
            enabled,
        }
    }

    pub fn key(address: &str) -> String {
        format!("{RATE_LIMIT_PREFIX}{address}")
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count this request and report whether it exceeds the limit.
    #[instrument(skip_all, fields(address = %hash_for_correlation(address)))]
    pub async fn is_limited(&self, address: &str) -> bool {
        if !self.enabled {
            return false;
        }

        let count = match self
            .store
            .increment_with_expiry(&Self::key(address), self.window)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                store_failure(CACHE_NAME, "increment", &e);
                record_rate_limit_decision("allowed");
                return false;
            }
        };

        let limited = count > self.limit;
        if limited {
            debug!(
                target: "sts.services.rate_limiter",
                count = count,
                limit = self.limit,
                "Request rate limited"
            );
        }
        record_rate_limit_decision(if limited { "rejected" } else { "allowed" });
        limited
    }

    /// Current window state without counting a request.
    #[instrument(skip_all, fields(address = %hash_for_correlation(address)))]
    pub async fn info(&self, address: &str) -> RateLimitInfo {
        if !self.enabled {
            return RateLimitInfo::new(self.limit, 0, -1);
        }

        let key = Self::key(address);
        let current = match self.store.get(&key).await {
            Ok(value) => value.and_then(|v| v.parse::<u64>().ok()).unwrap_or(0),
            Err(e) => {
                store_failure(CACHE_NAME, "get", &e);
                return RateLimitInfo::new(self.limit, 0, -1);
            }
        };

        let reset_seconds = match self.store.ttl(&key).await {
            Ok(Some(ttl)) => whole_seconds(ttl),
            Ok(None) => -1,
            Err(e) => {
                store_failure(CACHE_NAME, "ttl", &e);
                -1
            }
        };

        RateLimitInfo::new(self.limit, current, reset_seconds)
    }

    /// Drop the address's counter. Returns true when one existed.
    #[instrument(skip_all, fields(address = %hash_for_correlation(address)))]
    pub async fn reset(&self, address: &str) -> bool {
        match self.store.delete(&Self::key(address)).await {
            Ok(existed) => existed,
            Err(e) => {
                store_failure(CACHE_NAME, "delete", &e);
                false
            }
        }
    }
}

/// Remaining TTL in whole seconds, rounded up.
fn whole_seconds(ttl: Duration) -> i64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    i64::try_from(secs).unwrap_or(i64::MAX)
}

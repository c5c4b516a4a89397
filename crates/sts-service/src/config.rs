use common::secret::{secret_bytes, ExposeSecret, SecretBox};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Minimum HMAC secret length in bytes (256 bits).
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Default lifetime of a minted token.
pub const DEFAULT_TOKEN_VALIDITY_SECONDS: u64 = 3600;

/// Default upper bound for validation cache entries (5 minutes).
pub const DEFAULT_TOKEN_CACHE_TTL_SECONDS: u64 = 300;

/// Default client record cache lifetime (15 minutes).
pub const DEFAULT_CLIENT_CACHE_TTL_SECONDS: u64 = 900;

/// Default fixed-window size for rate limiting.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

/// Default number of requests admitted per window and address.
pub const DEFAULT_RATE_LIMIT_REQUESTS: u64 = 60;

/// Default revocation duration when the caller does not supply one.
pub const DEFAULT_REVOCATION_SECONDS: u64 = 3600;

/// Default ceiling on caller-supplied revocation durations (24 hours).
pub const DEFAULT_MAX_REVOCATION_SECONDS: u64 = 86_400;

/// Default per-call timeout for shared store round trips.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 500;

/// Default bcrypt cost factor for hashing client secrets.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum accepted bcrypt cost (OWASP guidance).
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum accepted bcrypt cost (latency bound).
pub const MAX_BCRYPT_COST: u32 = 14;

/// `REDIS_URL` value that selects the in-process store.
pub const IN_MEMORY_STORE_URL: &str = "memory://";

/// Service configuration, loaded once at startup and never mutated.
pub struct Config {
    pub bind_address: String,
    pub redis_url: String,
    pub database_url: Option<String>,
    pub clients_file: Option<String>,
    /// HMAC secret used to sign and verify tokens.
    pub jwt_secret: SecretBox<Vec<u8>>,
    pub token_validity: Duration,
    pub token_cache_ttl: Duration,
    pub token_cache_enabled: bool,
    pub client_cache_ttl: Duration,
    pub client_cache_enabled: bool,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u64,
    pub rate_limit_window: Duration,
    pub default_revocation: Duration,
    /// Upper bound for `duration_seconds` on revoke and blacklist requests.
    pub max_revocation: Duration,
    pub store_timeout: Duration,
    pub admin_endpoints_enabled: bool,
    pub bcrypt_cost: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("redis_url", &"[REDACTED]")
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("clients_file", &self.clients_file)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_validity", &self.token_validity)
            .field("token_cache_ttl", &self.token_cache_ttl)
            .field("token_cache_enabled", &self.token_cache_enabled)
            .field("client_cache_ttl", &self.client_cache_ttl)
            .field("client_cache_enabled", &self.client_cache_enabled)
            .field("rate_limit_enabled", &self.rate_limit_enabled)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("default_revocation", &self.default_revocation)
            .field("max_revocation", &self.max_revocation)
            .field("store_timeout", &self.store_timeout)
            .field("admin_endpoints_enabled", &self.admin_endpoints_enabled)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("JWT secret too weak: expected at least {MIN_JWT_SECRET_BYTES} bytes, got {0}")]
    WeakSecret(usize),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Invalid bcrypt cost: {0} (must be {MIN_BCRYPT_COST}-{MAX_BCRYPT_COST})")]
    InvalidBcryptCost(u32),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_secret = vars
            .get("STS_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("STS_JWT_SECRET".to_string()))?;

        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::WeakSecret(jwt_secret.len()));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let redis_url = vars
            .get("REDIS_URL")
            .cloned()
            .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let bcrypt_cost = parse_or(vars, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(bcrypt_cost));
        }

        let rate_limit_requests = parse_or(vars, "RATE_LIMIT_REQUESTS", DEFAULT_RATE_LIMIT_REQUESTS)?;
        if rate_limit_requests == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RATE_LIMIT_REQUESTS".to_string(),
                value: "0".to_string(),
            });
        }

        let default_revocation =
            seconds_or(vars, "DEFAULT_REVOCATION_SECONDS", DEFAULT_REVOCATION_SECONDS)?;
        let max_revocation =
            seconds_or(vars, "MAX_REVOCATION_SECONDS", DEFAULT_MAX_REVOCATION_SECONDS)?;
        if default_revocation > max_revocation {
            return Err(ConfigError::InvalidValue {
                name: "DEFAULT_REVOCATION_SECONDS".to_string(),
                value: default_revocation.as_secs().to_string(),
            });
        }

        Ok(Config {
            bind_address,
            redis_url,
            database_url: vars.get("DATABASE_URL").cloned(),
            clients_file: vars.get("STS_CLIENTS_FILE").cloned(),
            jwt_secret: secret_bytes(jwt_secret.as_bytes().to_vec()),
            token_validity: seconds_or(vars, "TOKEN_VALIDITY_SECONDS", DEFAULT_TOKEN_VALIDITY_SECONDS)?,
            token_cache_ttl: seconds_or(vars, "TOKEN_CACHE_TTL_SECONDS", DEFAULT_TOKEN_CACHE_TTL_SECONDS)?,
            token_cache_enabled: parse_or(vars, "TOKEN_CACHE_ENABLED", true)?,
            client_cache_ttl: seconds_or(vars, "CLIENT_CACHE_TTL_SECONDS", DEFAULT_CLIENT_CACHE_TTL_SECONDS)?,
            client_cache_enabled: parse_or(vars, "CLIENT_CACHE_ENABLED", true)?,
            rate_limit_enabled: parse_or(vars, "RATE_LIMIT_ENABLED", true)?,
            rate_limit_requests,
            rate_limit_window: seconds_or(vars, "RATE_LIMIT_WINDOW_SECONDS", DEFAULT_RATE_LIMIT_WINDOW_SECONDS)?,
            default_revocation,
            max_revocation,
            store_timeout: Duration::from_millis(parse_or(vars, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?),
            admin_endpoints_enabled: parse_or(vars, "ADMIN_ENDPOINTS_ENABLED", false)?,
            bcrypt_cost,
        })
    }

    /// Raw signing secret bytes.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret()
    }

    /// Whether the in-process store was requested instead of Redis.
    pub fn uses_in_memory_store(&self) -> bool {
        self.redis_url == IN_MEMORY_STORE_URL
    }
}

fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
        }),
    }
}

/// Parse a positive number of seconds.
fn seconds_or(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(vars, name, default)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: "0".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

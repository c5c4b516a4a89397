//! Security Token Service Library
//!
//! Issues, validates and revokes HMAC-signed bearer tokens for the OAuth
//! client-credentials grant, with validation caching, per-client token
//! reuse and fixed-window rate limiting over a shared key-value store.
//!
//! # Modules
//!
//! - `cache` - Keyspace wrappers (validation cache, blacklist, sessions, client records)
//! - `config` - Service configuration
//! - `crypto` - Token signing, fingerprints and client secret hashing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Rate limiting
//! - `models` - Data models
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - Client record lookup
//! - `routes` - Router and application state
//! - `services` - Issuance, validation, rate limiting and admin operations
//! - `store` - Shared store trait with Redis and in-memory backends

pub mod cache;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod store;

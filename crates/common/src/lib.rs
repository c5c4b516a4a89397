//! Common utilities shared across the Security Token Service crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for bearer token utilities (size limits, scheme parsing)
pub mod jwt;

//! # STS Test Utilities
//!
//! Shared test utilities for the Security Token Service.
//!
//! This crate provides:
//! - Deterministic fixtures (signing secret, cheap bcrypt hashes, client records)
//! - Test data builders (`TestTokenBuilder`)
//! - Server test harness (`TestStsServer` for E2E tests)
//! - Fixed test IDs and addresses
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sts_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestStsServer::spawn().await?;
//!
//!     let token = server
//!         .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
//!         .await?;
//!
//!     token
//!         .assert_valid_jwt()
//!         .assert_for_subject(TEST_CLIENT_ID_REPORTING)
//!         .assert_has_scope(SCOPE_REPORTS_READ);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;

//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] wrappers used for every sensitive value in the
//! token service: client secrets on the way in, the HMAC signing secret held
//! in configuration, and bearer tokens handed to operators.
//!
//! `SecretBox<T>` and `SecretString` implement `Debug` with redaction, so a
//! struct deriving `Debug` that contains one of them is safe to log. The
//! wrapped value is zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct TokenRequest {
//!     client_id: String,
//!     client_secret: SecretString,
//! }
//!
//! let req = TokenRequest {
//!     client_id: "billing-worker".to_string(),
//!     client_secret: SecretString::from("s3cr3t"),
//! };
//!
//! assert!(!format!("{req:?}").contains("s3cr3t"));
//! assert_eq!(req.client_secret.expose_secret(), "s3cr3t");
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for client secrets and bearer tokens; use
//! `SecretBox<Vec<u8>>` for raw key material such as the signing secret.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// Wrap raw key bytes so they cannot be printed by accident.
#[must_use]
pub fn secret_bytes(bytes: Vec<u8>) -> SecretBox<Vec<u8>> {
    SecretBox::new(Box::new(bytes))
}

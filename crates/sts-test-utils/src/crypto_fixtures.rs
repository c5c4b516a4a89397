//! Deterministic fixtures for testing
//!
//! The signing secret is fixed so tokens built by [`crate::TestTokenBuilder`]
//! verify against a [`crate::TestStsServer`]. Client secrets are hashed at
//! the minimum bcrypt cost to keep tests fast.

use crate::test_ids::*;
use std::collections::BTreeSet;
use sts_service::models::ClientIdentity;

/// Signing secret shared by the test server and token builders (≥32 bytes).
pub const TEST_JWT_SECRET: &str = "sts-test-signing-secret-not-for-production-use";

/// A different secret of valid length, for forged-signature tests.
pub const TEST_OTHER_JWT_SECRET: &str = "some-other-signing-secret-also-32-bytes-plus";

/// Lowest cost bcrypt accepts.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Hash a client secret at [`TEST_BCRYPT_COST`].
pub fn test_secret_hash(secret: &str) -> String {
    bcrypt::hash(secret, TEST_BCRYPT_COST).expect("bcrypt hashing should succeed")
}

/// Build a client record whose secret is [`TEST_CLIENT_SECRET`].
pub fn test_client(client_id: &str, display_name: &str, scopes: &[&str]) -> ClientIdentity {
    ClientIdentity {
        client_id: client_id.to_string(),
        display_name: display_name.to_string(),
        secret_hash: test_secret_hash(TEST_CLIENT_SECRET),
        scopes: scopes.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        active: true,
    }
}

/// Clients seeded into every [`crate::TestStsServer`]:
/// an active reporting client, an active billing client and an inactive one.
pub fn default_test_clients() -> Vec<ClientIdentity> {
    let mut inactive = test_client(TEST_CLIENT_ID_INACTIVE, "Retired Service", &[]);
    inactive.active = false;

    vec![
        test_client(
            TEST_CLIENT_ID_REPORTING,
            TEST_DISPLAY_NAME_REPORTING,
            &[SCOPE_REPORTS_READ, SCOPE_METRICS_READ],
        ),
        test_client(
            TEST_CLIENT_ID_BILLING,
            TEST_DISPLAY_NAME_BILLING,
            &[SCOPE_INVOICES_WRITE],
        ),
        inactive,
    ]
}

//! Fixed test identifiers for deterministic tests

// Client IDs
pub const TEST_CLIENT_ID_REPORTING: &str = "reporting-test-client";
pub const TEST_CLIENT_ID_BILLING: &str = "billing-test-client";
pub const TEST_CLIENT_ID_INACTIVE: &str = "inactive-test-client";
pub const TEST_CLIENT_ID_UNKNOWN: &str = "unknown-test-client";

// Display names
pub const TEST_DISPLAY_NAME_REPORTING: &str = "Reporting Service";
pub const TEST_DISPLAY_NAME_BILLING: &str = "Billing Service";

// Test secrets (shared by every seeded client)
pub const TEST_CLIENT_SECRET: &str = "test-secret-do-not-use-in-production";
pub const TEST_WRONG_SECRET: &str = "not-the-right-secret";

// Test scopes
pub const SCOPE_REPORTS_READ: &str = "reports:read";
pub const SCOPE_METRICS_READ: &str = "metrics:read";
pub const SCOPE_INVOICES_WRITE: &str = "invoices:write";

// Client addresses (RFC 5737 documentation ranges)
pub const TEST_ADDRESS_1: &str = "203.0.113.10";
pub const TEST_ADDRESS_2: &str = "198.51.100.20";

//! Integration tests for the client-credentials token endpoint

use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use sts_service::models::TokenResponse;
use sts_service::store::SharedStore;
use sts_test_utils::*;

#[tokio::test]
async fn test_issue_token_with_json_credentials() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let response = server
        .request_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: TokenResponse = response.json().await?;
    assert_eq!(body.token_type, "Bearer");
    assert!(body.expires_in > 0 && body.expires_in <= 3600);

    body.access_token
        .assert_valid_jwt()
        .assert_for_subject(TEST_CLIENT_ID_REPORTING)
        .assert_display_name(TEST_DISPLAY_NAME_REPORTING)
        .assert_has_scope(SCOPE_REPORTS_READ)
        .assert_has_scope(SCOPE_METRICS_READ)
        .assert_expires_in(3600);

    Ok(())
}

#[tokio::test]
async fn test_issue_token_with_basic_auth() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let credentials = general_purpose::STANDARD
        .encode(format!("{TEST_CLIENT_ID_BILLING}:{TEST_CLIENT_SECRET}"));

    let response = server
        .client()
        .post(format!("{}/api/v1/auth/token", server.url()))
        .header("Authorization", format!("Basic {credentials}"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: TokenResponse = response.json().await?;
    body.access_token
        .assert_for_subject(TEST_CLIENT_ID_BILLING)
        .assert_has_scope(SCOPE_INVOICES_WRITE);

    Ok(())
}

#[tokio::test]
async fn test_rapid_requests_return_identical_token() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let first = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    let second = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    assert_eq!(first, second, "current token should be reused");
    assert_eq!(
        server.repository().lookup_count(),
        1,
        "second request should be served from the client cache"
    );

    Ok(())
}

#[tokio::test]
async fn test_different_clients_get_different_tokens() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let reporting = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    let billing = server
        .issue_token(TEST_CLIENT_ID_BILLING, TEST_CLIENT_SECRET)
        .await?;

    assert_ne!(reporting, billing);
    Ok(())
}

#[tokio::test]
async fn test_credential_failures_share_one_response() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let cases = [
        (TEST_CLIENT_ID_UNKNOWN, TEST_CLIENT_SECRET),
        (TEST_CLIENT_ID_INACTIVE, TEST_CLIENT_SECRET),
        (TEST_CLIENT_ID_REPORTING, TEST_WRONG_SECRET),
    ];

    let mut bodies = Vec::new();
    for (client_id, secret) in cases {
        let response = server.request_token(client_id, secret).await?;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{client_id} should be rejected"
        );
        bodies.push(response.text().await?);
    }

    let first = bodies.first().cloned().unwrap_or_default();
    let body: serde_json::Value = serde_json::from_str(&first)?;
    assert_eq!(body["error"]["code"], "INVALID_CLIENT");
    assert!(
        bodies.iter().all(|b| b == &first),
        "credential failures must be indistinguishable: {bodies:?}"
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/auth/token", server.url()))
        .json(&serde_json::json!({ "client_id": TEST_CLIENT_ID_REPORTING }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    Ok(())
}

#[tokio::test]
async fn test_issued_token_lifetime_follows_config() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder()
        .token_validity_seconds(120)
        .spawn()
        .await?;

    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    token.assert_expires_in(120);
    Ok(())
}

#[tokio::test]
async fn test_token_cache_disabled_mints_every_time() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder()
        .token_cache_enabled(false)
        .spawn()
        .await?;

    server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    assert!(
        server.store().keys("client_token:*").await?.is_empty(),
        "no session entry without the validation cache"
    );
    assert!(server.store().keys("token_cache:*").await?.is_empty());

    Ok(())
}

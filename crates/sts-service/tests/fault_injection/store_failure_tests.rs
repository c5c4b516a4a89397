//! Shared store outage behaviour
//!
//! The store is an accelerator: issuance and validation keep working
//! without it, revocation does not.

use reqwest::StatusCode;
use sts_test_utils::*;

#[tokio::test]
async fn test_readiness_reports_store_outage() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server.store().set_unavailable(true);

    let ready = server
        .client()
        .get(format!("{}/ready", server.url()))
        .send()
        .await?;
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = ready.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["store"], "unavailable");

    // Liveness does not depend on the store
    let health = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;
    assert_eq!(health.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_readiness_recovers_with_store() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server.store().set_unavailable(true);
    server.store().set_unavailable(false);

    let ready = server
        .client()
        .get(format!("{}/ready", server.url()))
        .send()
        .await?;
    assert_eq!(ready.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_issued_token_validates_during_outage() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    server.store().set_unavailable(true);

    let response = server.validate(&token).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_issuance_continues_during_outage() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server.store().set_unavailable(true);

    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    token
        .assert_valid_jwt()
        .assert_for_subject(TEST_CLIENT_ID_REPORTING);
    // Every request goes to the repository without the client cache
    server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    assert_eq!(server.repository().lookup_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rate_limiter_fails_open() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder().rate_limit(1).spawn().await?;
    server.store().set_unavailable(true);

    for _ in 0..3 {
        let response = server
            .request_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    Ok(())
}

#[tokio::test]
async fn test_revocation_fails_during_outage() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    server.store().set_unavailable(true);

    let response = server
        .client()
        .post(format!("{}/api/v1/auth/revoke", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");

    Ok(())
}

#[tokio::test]
async fn test_admin_clear_reports_outage() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server.store().set_unavailable(true);

    let response = server
        .client()
        .post(format!("{}/api/v1/admin/cache/tokens/clear", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

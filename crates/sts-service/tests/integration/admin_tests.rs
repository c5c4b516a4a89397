//! Integration tests for operator endpoints

use reqwest::StatusCode;
use sts_service::store::SharedStore;
use sts_test_utils::*;

async fn post(server: &TestStsServer, path: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .post(format!("{}{}", server.url(), path))
        .send()
        .await?)
}

async fn get_json(server: &TestStsServer, path: &str) -> Result<serde_json::Value, anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}{}", server.url(), path))
        .send()
        .await?;
    anyhow::ensure!(response.status() == StatusCode::OK, "GET {path} failed");
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_admin_endpoints_hidden_when_disabled() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder()
        .admin_endpoints(false)
        .spawn()
        .await?;

    let response = post(&server, "/api/v1/admin/cache/tokens/clear").await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_clear_token_cache_forgets_revocations() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    server.service().admin().revoke_token(&token, None).await?;

    let response = post(&server, "/api/v1/admin/cache/tokens/clear").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    // session entry and blacklist marker; the cache entry went with the revocation
    assert_eq!(body["removed"], 2);

    assert!(server.store().keys("token_blacklist:*").await?.is_empty());
    assert!(server.store().keys("client_token:*").await?.is_empty());
    // client records survive
    assert_eq!(server.store().keys("client_cache:*").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_clear_client_cache_and_stats() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    server
        .issue_token(TEST_CLIENT_ID_BILLING, TEST_CLIENT_SECRET)
        .await?;

    let stats = get_json(&server, "/api/v1/admin/cache/stats").await?;
    assert_eq!(stats["client_cache_size"], 2);

    let response = post(&server, "/api/v1/admin/cache/clients/clear").await?;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = get_json(&server, "/api/v1/admin/cache/stats").await?;
    assert_eq!(stats["client_cache_size"], 0);

    Ok(())
}

#[tokio::test]
async fn test_invalidate_client_forces_fresh_lookup_and_mint() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    assert_eq!(server.repository().lookup_count(), 1);

    let response = post(
        &server,
        &format!("/api/v1/admin/cache/invalidate/client/{TEST_CLIENT_ID_REPORTING}"),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["removed"], true);

    assert!(server.store().keys("client_token:*").await?.is_empty());
    assert!(server.store().keys("token_cache:*").await?.is_empty());

    server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    assert_eq!(server.repository().lookup_count(), 2);
    assert_eq!(server.store().keys("client_token:*").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_revoke_client_session_and_debug() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    let debug_path = format!("/api/v1/admin/debug/cache/{TEST_CLIENT_ID_REPORTING}");
    let debug = get_json(&server, &debug_path).await?;
    assert_eq!(debug["client_id"], TEST_CLIENT_ID_REPORTING);
    assert_eq!(debug["has_valid_token"], true);
    assert!(debug["checked_at"].as_i64().is_some());

    let response = post(
        &server,
        &format!("/api/v1/admin/client/{TEST_CLIENT_ID_REPORTING}/revoke-token"),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let debug = get_json(&server, &debug_path).await?;
    assert_eq!(debug["has_valid_token"], false);
    // dropping the session does not blacklist the token
    assert_eq!(server.validate(&token).await?.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_blacklist_token_endpoint() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    let response = post(
        &server,
        &format!("/api/v1/admin/tokens/{token}/blacklist?duration_seconds=60"),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        server.validate(&token).await?.status(),
        StatusCode::UNAUTHORIZED
    );
    let debug = get_json(
        &server,
        &format!("/api/v1/admin/debug/cache/{TEST_CLIENT_ID_REPORTING}"),
    )
    .await?;
    assert_eq!(debug["has_valid_token"], false);

    Ok(())
}

#[tokio::test]
async fn test_blacklist_rejects_duration_above_maximum() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder()
        .var("MAX_REVOCATION_SECONDS", 600)
        .var("DEFAULT_REVOCATION_SECONDS", 600)
        .spawn()
        .await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    let rejected = post(
        &server,
        &format!("/api/v1/admin/tokens/{token}/blacklist?duration_seconds=601"),
    )
    .await?;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert!(server.store().keys("token_blacklist:*").await?.is_empty());

    let accepted = post(
        &server,
        &format!("/api/v1/admin/tokens/{token}/blacklist?duration_seconds=600"),
    )
    .await?;
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(server.store().keys("token_blacklist:*").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_debug_client_does_not_mutate_store() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    server.service().admin().revoke_token(&token, None).await?;

    let mut before = server.store().keys("*").await?;
    before.sort();
    get_json(
        &server,
        &format!("/api/v1/admin/debug/cache/{TEST_CLIENT_ID_REPORTING}"),
    )
    .await?;
    let mut after = server.store().keys("*").await?;
    after.sort();

    // only the caller's rate-limit counter may differ
    before.retain(|k| !k.starts_with("rate_limit:"));
    after.retain(|k| !k.starts_with("rate_limit:"));
    assert_eq!(before, after);

    Ok(())
}

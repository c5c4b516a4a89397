//! Integration tests for token validation and revocation

use reqwest::StatusCode;
use sts_service::models::ValidationResult;
use sts_service::store::SharedStore;
use sts_test_utils::*;

#[tokio::test]
async fn test_issued_token_validates_with_its_claims() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    let response = server.validate(&token).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let result: ValidationResult = response.json().await?;
    assert!(result.valid);
    assert_eq!(result.message, "valid");
    let claims = result
        .claims
        .ok_or_else(|| anyhow::anyhow!("valid result must carry claims"))?;
    assert_eq!(claims.subject, TEST_CLIENT_ID_REPORTING);
    assert_eq!(claims.display_name, TEST_DISPLAY_NAME_REPORTING);
    assert_eq!(
        claims.scopes,
        vec![SCOPE_METRICS_READ.to_string(), SCOPE_REPORTS_READ.to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_authorization_header() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/auth/validate", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    Ok(())
}

#[tokio::test]
async fn test_invalid_tokens_report_reason() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let expired = TestTokenBuilder::new()
        .for_client(TEST_CLIENT_ID_REPORTING)
        .expires_in(-60)
        .build();
    let forged = TestTokenBuilder::new()
        .for_client(TEST_CLIENT_ID_REPORTING)
        .signed_with(TEST_OTHER_JWT_SECRET)
        .build();
    let oversized = "a".repeat(common::jwt::MAX_JWT_SIZE_BYTES + 1);

    let cases = [
        (expired.as_str(), "expired"),
        (forged.as_str(), "signature_invalid"),
        ("not-a-token", "malformed"),
        (oversized.as_str(), "malformed"),
    ];

    for (token, reason) in cases {
        let response = server.validate(token).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{reason}");
        let result: ValidationResult = response.json().await?;
        assert!(!result.valid);
        assert_eq!(result.message, reason);
        assert!(result.claims.is_none());
    }

    Ok(())
}

#[tokio::test]
async fn test_revoked_token_is_rejected_and_replaced() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    // Warm the validation cache
    assert_eq!(server.validate(&token).await?.status(), StatusCode::OK);

    let response = server
        .client()
        .post(format!("{}/api/v1/auth/revoke", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.validate(&token).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let result: ValidationResult = response.json().await?;
    assert_eq!(result.message, "revoked");

    let replacement = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    assert_ne!(replacement, token, "a revoked token must never be reissued");
    assert_eq!(server.validate(&replacement).await?.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_revoke_with_custom_duration() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    let response = server
        .client()
        .post(format!(
            "{}/api/v1/auth/revoke?duration_seconds=120",
            server.url()
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let blacklisted = server.store().keys("token_blacklist:*").await?;
    assert_eq!(blacklisted.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_revoke_rejects_zero_duration() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let response = server
        .client()
        .post(format!(
            "{}/api/v1/auth/revoke?duration_seconds=0",
            server.url()
        ))
        .bearer_auth("aaa.bbb.ccc")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_revoke_rejects_duration_above_maximum() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    let max = server.config().max_revocation.as_secs();

    for duration in [max + 1, u64::MAX] {
        let response = server
            .client()
            .post(format!(
                "{}/api/v1/auth/revoke?duration_seconds={duration}",
                server.url()
            ))
            .bearer_auth(&token)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{duration}");
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    }

    assert!(server.store().keys("token_blacklist:*").await?.is_empty());
    // The server is still serving and the token was never revoked
    assert_eq!(server.validate(&token).await?.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_revoke_requires_bearer_token() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/auth/revoke", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

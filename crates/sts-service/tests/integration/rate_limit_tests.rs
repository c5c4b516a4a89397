//! Integration tests for the fixed-window rate limiter

use reqwest::StatusCode;
use sts_test_utils::*;

async fn validate_from(
    server: &TestStsServer,
    address: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .get(format!("{}/api/v1/auth/validate", server.url()))
        .header("X-Forwarded-For", address)
        .bearer_auth("aaa.bbb.ccc")
        .send()
        .await?)
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn test_fourth_request_in_window_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder().rate_limit(3).spawn().await?;

    for expected_remaining in ["2", "1", "0"] {
        let response = validate_from(&server, TEST_ADDRESS_1).await?;
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(header(&response, "x-ratelimit-limit").as_deref(), Some("3"));
        assert_eq!(
            header(&response, "x-ratelimit-remaining").as_deref(),
            Some(expected_remaining)
        );
    }

    let response = validate_from(&server, TEST_ADDRESS_1).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: i64 = header(&response, "retry-after")
        .ok_or_else(|| anyhow::anyhow!("missing Retry-After"))?
        .parse()?;
    assert!((1..=60).contains(&retry_after));

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"], "rate_limit_exceeded");
    assert_eq!(body["limit"], 3);
    assert_eq!(body["remaining"], 0);
    assert!(body["reset_in_seconds"].as_i64().is_some());

    Ok(())
}

#[tokio::test]
async fn test_addresses_are_counted_separately() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder().rate_limit(1).spawn().await?;

    validate_from(&server, TEST_ADDRESS_1).await?;
    let limited = validate_from(&server, TEST_ADDRESS_1).await?;
    let other = validate_from(&server, TEST_ADDRESS_2).await?;

    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_ne!(other.status(), StatusCode::TOO_MANY_REQUESTS);

    Ok(())
}

#[tokio::test]
async fn test_token_endpoint_is_limited() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder().rate_limit(1).spawn().await?;

    let first = server
        .request_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    let second = server
        .request_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    Ok(())
}

#[tokio::test]
async fn test_reset_restores_budget() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder().rate_limit(1).spawn().await?;
    validate_from(&server, TEST_ADDRESS_1).await?;
    assert_eq!(
        validate_from(&server, TEST_ADDRESS_1).await?.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // Reset via the service: the admin route itself is rate limited
    assert!(
        server
            .service()
            .admin()
            .reset_rate_limit(TEST_ADDRESS_1)
            .await
    );

    assert_ne!(
        validate_from(&server, TEST_ADDRESS_1).await?.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    Ok(())
}

#[tokio::test]
async fn test_reset_endpoint() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder().rate_limit(2).spawn().await?;
    validate_from(&server, TEST_ADDRESS_1).await?;

    let response = server
        .client()
        .post(format!(
            "{}/api/v1/admin/rate-limit/{TEST_ADDRESS_1}/reset",
            server.url()
        ))
        .header("X-Forwarded-For", TEST_ADDRESS_2)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["removed"], true);
    assert_eq!(body["address"], TEST_ADDRESS_1);

    Ok(())
}

#[tokio::test]
async fn test_disabled_limiter_adds_no_headers() -> Result<(), anyhow::Error> {
    let server = TestStsServer::builder()
        .rate_limit(1)
        .rate_limit_enabled(false)
        .spawn()
        .await?;

    for _ in 0..3 {
        let response = validate_from(&server, TEST_ADDRESS_1).await?;
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(header(&response, "x-ratelimit-limit").is_none());
    }

    Ok(())
}

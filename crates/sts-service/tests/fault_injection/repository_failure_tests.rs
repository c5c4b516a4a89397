//! Client repository outage behaviour

use reqwest::StatusCode;
use sts_test_utils::*;

#[tokio::test]
async fn test_repository_outage_is_internal_error() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    server.repository().set_unavailable(true);

    let response = server
        .request_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    // No driver detail reaches the caller
    assert_eq!(
        body["error"]["message"],
        "An internal database error occurred"
    );

    Ok(())
}

#[tokio::test]
async fn test_cached_client_survives_repository_outage() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let first = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    server.repository().set_unavailable(true);

    let second = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_validation_does_not_touch_repository() -> Result<(), anyhow::Error> {
    let server = TestStsServer::spawn().await?;
    let token = server
        .issue_token(TEST_CLIENT_ID_REPORTING, TEST_CLIENT_SECRET)
        .await?;

    server.repository().set_unavailable(true);

    assert_eq!(server.validate(&token).await?.status(), StatusCode::OK);
    Ok(())
}

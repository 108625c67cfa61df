//! Shared-secret (API key) authentication integration tests.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use dg_test_utils::server_harness::{api_key_vars, TestGateway};
use serde_json::Value;

async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Expected JSON error body");
    body["error"]["code"]
        .as_str()
        .expect("Expected error code")
        .to_string()
}

#[tokio::test]
async fn test_valid_api_key_returns_synthetic_principal() -> Result<()> {
    let gateway = TestGateway::spawn(api_key_vars("dev-secret")).await?;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/v1/me", gateway.url()))
        .header("x-api-key", "dev-secret")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["sub"], "api-key-user");
    assert_eq!(body["method"], "api_key");
    assert_eq!(body["claims"]["auth"], "api_key");
    Ok(())
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected_without_challenge() -> Result<()> {
    let gateway = TestGateway::spawn(api_key_vars("dev-secret")).await?;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/v1/me", gateway.url()))
        .header("x-api-key", "wrong-secret")
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    // API-key failures are not bearer failures: no challenge header
    assert!(response.headers().get("WWW-Authenticate").is_none());
    assert_eq!(error_code(response).await, "INVALID_CREDENTIAL");
    Ok(())
}

#[tokio::test]
async fn test_missing_api_key_is_rejected() -> Result<()> {
    let gateway = TestGateway::spawn(api_key_vars("dev-secret")).await?;

    let response = reqwest::get(format!("{}/v1/me", gateway.url())).await?;

    assert_eq!(response.status(), 401);
    assert_eq!(error_code(response).await, "INVALID_CREDENTIAL");
    Ok(())
}

#[tokio::test]
async fn test_custom_header_name_with_mixed_case() -> Result<()> {
    let mut vars = api_key_vars("dev-secret");
    vars.insert("API_KEY_HEADER".to_string(), "X-Gateway-Key".to_string());
    let gateway = TestGateway::spawn(vars).await?;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/v1/me", gateway.url()))
        .header("X-GATEWAY-KEY", "dev-secret")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_bearer_header_is_not_a_substitute_for_api_key() -> Result<()> {
    // In API_KEY mode a bearer token must never be considered: the request
    // fails with the API-key error, not a token error
    let gateway = TestGateway::spawn(api_key_vars("dev-secret")).await?;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/v1/me", gateway.url()))
        .header("authorization", "Bearer some.jwt.token")
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    assert_eq!(error_code(response).await, "INVALID_CREDENTIAL");
    Ok(())
}

#[tokio::test]
async fn test_health_endpoint_is_public() -> Result<()> {
    let gateway = TestGateway::spawn(api_key_vars("dev-secret")).await?;

    let response = reqwest::get(format!("{}/v1/health", gateway.url())).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["auth_mode"], "api_key");
    assert_eq!(body["store"], "healthy");
    Ok(())
}

//! Metadata client integration tests against a mocked issuer.

// Test code is allowed to use expect/unwrap/panic for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use dg_test_utils::token_builders::{discovery_json, jwks_json};
use dg_test_utils::TestRsaKey;
use doc_gateway::auth::MetadataClient;
use doc_gateway::errors::GatewayError;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DISCOVERY_PATH: &str = "/v2.0/.well-known/openid-configuration";

async fn mount_discovery(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_json(
            &format!("{}/v2.0", server.uri()),
            &format!("{}/keys", server.uri()),
        )))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discovery_is_cached_within_ttl() {
    let server = MockServer::start().await;
    mount_discovery(&server, 1).await;

    let client = MetadataClient::new();
    let url = format!("{}{}", server.uri(), DISCOVERY_PATH);

    let first = client.get_discovery(&url).await.expect("First fetch");
    let second = client.get_discovery(&url).await.expect("Cached fetch");

    // Identical results without a second network call (wiremock verifies
    // the expectation on drop)
    assert_eq!(first.jwks_uri, second.jwks_uri);
}

#[tokio::test]
async fn test_discovery_is_refetched_after_ttl() {
    let server = MockServer::start().await;
    mount_discovery(&server, 2).await;

    let client = MetadataClient::with_ttl(Duration::from_millis(50));
    let url = format!("{}{}", server.uri(), DISCOVERY_PATH);

    client.get_discovery(&url).await.expect("First fetch");
    tokio::time::sleep(Duration::from_millis(200)).await;
    client.get_discovery(&url).await.expect("Fetch after expiry");
}

#[tokio::test]
async fn test_key_set_is_cached_within_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(&[TestRsaKey::primary().jwk()])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = MetadataClient::new();
    let url = format!("{}/keys", server.uri());

    let first = client.get_key_set(&url).await.expect("First fetch");
    let second = client.get_key_set(&url).await.expect("Cached fetch");

    assert_eq!(first.keys.len(), 1);
    assert_eq!(second.keys.len(), 1);
    assert_eq!(
        first.keys.first().unwrap().kid,
        second.keys.first().unwrap().kid
    );
}

#[tokio::test]
async fn test_cache_is_keyed_by_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tenant-a/keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(&[TestRsaKey::primary().jwk()])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tenant-b/keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(&[TestRsaKey::secondary().jwk()])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = MetadataClient::new();

    let a = client
        .get_key_set(&format!("{}/tenant-a/keys", server.uri()))
        .await
        .expect("Fetch for tenant a");
    assert_eq!(a.keys.first().unwrap().kid, "test-key-01");

    // Different URL misses the single-entry cache and fetches fresh
    let b = client
        .get_key_set(&format!("{}/tenant-b/keys", server.uri()))
        .await
        .expect("Fetch for tenant b");
    assert_eq!(b.keys.first().unwrap().kid, "test-key-02");
}

#[tokio::test]
async fn test_non_2xx_status_is_metadata_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = MetadataClient::new();
    let url = format!("{}{}", server.uri(), DISCOVERY_PATH);

    let result = client.get_discovery(&url).await;
    match result {
        Err(GatewayError::MetadataFetch(reason)) => {
            assert!(reason.contains("503"), "Expected status in reason: {}", reason);
        }
        other => panic!("Expected MetadataFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_metadata_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = MetadataClient::new();
    let url = format!("{}{}", server.uri(), DISCOVERY_PATH);

    let result = client.get_discovery(&url).await;
    assert!(matches!(result, Err(GatewayError::MetadataFetch(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_metadata_fetch_error() {
    let client = MetadataClient::new();

    // Nothing listens on this port
    let result = client
        .get_discovery("http://127.0.0.1:9/.well-known/openid-configuration")
        .await;

    assert!(matches!(result, Err(GatewayError::MetadataFetch(_))));
}

#[tokio::test]
async fn test_error_responses_are_not_cached() {
    let server = MockServer::start().await;
    let client = MetadataClient::new();
    let url = format!("{}{}", server.uri(), DISCOVERY_PATH);

    // First attempt fails
    let failing = Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount_as_scoped(&server)
        .await;
    assert!(client.get_discovery(&url).await.is_err());
    drop(failing);

    // Endpoint recovers; the next call fetches fresh instead of replaying
    // the failure
    mount_discovery(&server, 1).await;
    let document = client.get_discovery(&url).await.expect("Recovered fetch");
    assert!(document.jwks_uri.ends_with("/keys"));
}

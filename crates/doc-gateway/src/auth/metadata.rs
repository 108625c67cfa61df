//! Issuer metadata client: discovery document and JWKS fetching with caching.
//!
//! The client fetches the OpenID Connect discovery document and the key set
//! it points at, and caches each with a fixed TTL so issuer endpoints are not
//! hit on every request. Each cache holds a single entry keyed by its source
//! URL — this service supports exactly one configured issuer, so a larger
//! cache would never fill. A changed URL is treated as a miss.
//!
//! # Concurrency
//!
//! Caches are `RwLock`-guarded and safe for concurrent readers. Two
//! concurrent misses may both fetch; the last write wins. This is harmless
//! because the fetched value is idempotent for a given URL within the TTL
//! window.

use crate::errors::GatewayError;
use crate::observability::metrics::record_metadata_fetch;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Cache TTL for discovery documents and key sets (1 hour).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// Timeout for outbound metadata requests.
const FETCH_TIMEOUT_SECONDS: u64 = 10;

/// OpenID Connect discovery document.
///
/// Only `jwks_uri` is required; everything else the issuer publishes is
/// ignored. A document without `jwks_uri` fails deserialization and surfaces
/// as a metadata fetch error.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    /// URL of the issuer's published key set.
    pub jwks_uri: String,

    /// Issuer identifier as published in the document.
    #[serde(default)]
    pub issuer: Option<String>,
}

/// A single JSON Web Key from the issuer's key set.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key ID used to select the verification key. Keys published without
    /// one deserialize with an empty id and can never match a token.
    #[serde(default)]
    pub kid: String,

    /// Key type ("RSA" for the supported issuer).
    #[serde(default)]
    pub kty: String,

    /// Algorithm hint. Key metadata does not always carry this.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,
}

/// The issuer's published key set.
///
/// Keys keep the order they were published in: when duplicate `kid` values
/// exist the first occurrence is authoritative.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySet {
    pub keys: Vec<Jwk>,
}

impl KeySet {
    /// Find the first key whose `kid` matches.
    pub fn key_for(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// A cached document with its source URL and expiry time.
struct CachedDocument<T> {
    url: String,
    value: T,
    expires_at: Instant,
}

/// Client for fetching and caching issuer metadata.
///
/// Constructed once (per token verifier) and shared; both caches live for
/// the life of the process.
pub struct MetadataClient {
    http_client: reqwest::Client,
    discovery: Arc<RwLock<Option<CachedDocument<DiscoveryDocument>>>>,
    keys: Arc<RwLock<Option<CachedDocument<KeySet>>>>,
    cache_ttl: Duration,
}

impl MetadataClient {
    /// Create a new metadata client with the default 1-hour cache TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a new metadata client with a custom cache TTL.
    pub fn with_ttl(cache_ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "dg.auth.metadata", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            discovery: Arc::new(RwLock::new(None)),
            keys: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    /// Fetch the discovery document, from cache when fresh.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_discovery(&self, url: &str) -> Result<DiscoveryDocument, GatewayError> {
        if let Some(cached) = Self::cache_lookup(&self.discovery, url).await {
            tracing::debug!(target: "dg.auth.metadata", "Discovery cache hit");
            return Ok(cached);
        }

        let document: DiscoveryDocument = match self.fetch(url, "OIDC metadata").await {
            Ok(document) => document,
            Err(e) => {
                record_metadata_fetch("discovery", "error");
                return Err(e);
            }
        };
        record_metadata_fetch("discovery", "success");

        tracing::info!(
            target: "dg.auth.metadata",
            jwks_uri = %document.jwks_uri,
            "Discovery document refreshed"
        );

        Self::cache_store(&self.discovery, url, document.clone(), self.cache_ttl).await;
        Ok(document)
    }

    /// Fetch the key set, from cache when fresh.
    #[instrument(skip(self), fields(url = %jwks_uri))]
    pub async fn get_key_set(&self, jwks_uri: &str) -> Result<KeySet, GatewayError> {
        if let Some(cached) = Self::cache_lookup(&self.keys, jwks_uri).await {
            tracing::debug!(target: "dg.auth.metadata", "JWKS cache hit");
            return Ok(cached);
        }

        let key_set: KeySet = match self.fetch(jwks_uri, "JWKS").await {
            Ok(key_set) => key_set,
            Err(e) => {
                record_metadata_fetch("jwks", "error");
                return Err(e);
            }
        };
        record_metadata_fetch("jwks", "success");

        tracing::info!(
            target: "dg.auth.metadata",
            key_count = key_set.keys.len(),
            "JWKS cache refreshed"
        );

        Self::cache_store(&self.keys, jwks_uri, key_set.clone(), self.cache_ttl).await;
        Ok(key_set)
    }

    /// Look up a fresh cache entry for the given URL.
    async fn cache_lookup<T: Clone>(
        cache: &RwLock<Option<CachedDocument<T>>>,
        url: &str,
    ) -> Option<T> {
        let cache = cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.url == url && c.expires_at > Instant::now())
            .map(|c| c.value.clone())
    }

    /// Store a value, replacing whatever entry was there.
    async fn cache_store<T>(
        cache: &RwLock<Option<CachedDocument<T>>>,
        url: &str,
        value: T,
        ttl: Duration,
    ) {
        let mut cache = cache.write().await;
        *cache = Some(CachedDocument {
            url: url.to_string(),
            value,
            expires_at: Instant::now() + ttl,
        });
    }

    /// GET a JSON document from the issuer.
    async fn fetch<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, GatewayError> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!(target: "dg.auth.metadata", error = %e, url = %url, "Metadata request failed");
            GatewayError::MetadataFetch(format!("{} fetch failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "dg.auth.metadata",
                status = %status,
                url = %url,
                "Metadata endpoint returned error"
            );
            return Err(GatewayError::MetadataFetch(format!(
                "{} fetch failed: endpoint returned {}",
                what, status
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(target: "dg.auth.metadata", error = %e, url = %url, "Failed to parse metadata response");
            GatewayError::MetadataFetch(format!("{} fetch failed: invalid JSON body: {}", what, e))
        })
    }
}

impl Default for MetadataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_document_deserialization() {
        let json = r#"{
            "issuer": "https://login.microsoftonline.com/tenant-123/v2.0",
            "jwks_uri": "https://login.microsoftonline.com/tenant-123/discovery/v2.0/keys",
            "token_endpoint": "https://login.microsoftonline.com/tenant-123/oauth2/v2.0/token"
        }"#;

        let doc: DiscoveryDocument = serde_json::from_str(json).unwrap();

        assert_eq!(
            doc.jwks_uri,
            "https://login.microsoftonline.com/tenant-123/discovery/v2.0/keys"
        );
        assert_eq!(
            doc.issuer.as_deref(),
            Some("https://login.microsoftonline.com/tenant-123/v2.0")
        );
    }

    #[test]
    fn test_discovery_document_requires_jwks_uri() {
        let json = r#"{"issuer": "https://example.com"}"#;

        let result: Result<DiscoveryDocument, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_jwk_deserialization() {
        let json = r#"{
            "kty": "RSA",
            "kid": "abc",
            "use": "sig",
            "alg": "RS256",
            "n": "modulus",
            "e": "AQAB"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kid, "abc");
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.alg.as_deref(), Some("RS256"));
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert_eq!(jwk.n.as_deref(), Some("modulus"));
        assert_eq!(jwk.e.as_deref(), Some("AQAB"));
    }

    #[test]
    fn test_jwk_deserialization_minimal() {
        // Keys without kid or material still deserialize; they just never match
        let jwk: Jwk = serde_json::from_str(r#"{"kty": "RSA"}"#).unwrap();

        assert_eq!(jwk.kid, "");
        assert!(jwk.alg.is_none());
        assert!(jwk.n.is_none());
        assert!(jwk.e.is_none());
    }

    #[test]
    fn test_key_set_preserves_order_and_first_match_wins() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "dup", "n": "first"},
                {"kty": "RSA", "kid": "other", "n": "second"},
                {"kty": "RSA", "kid": "dup", "n": "third"}
            ]
        }"#;

        let key_set: KeySet = serde_json::from_str(json).unwrap();

        assert_eq!(key_set.keys.len(), 3);
        let matched = key_set.key_for("dup").expect("Expected a match");
        assert_eq!(matched.n.as_deref(), Some("first"));
    }

    #[test]
    fn test_key_set_no_match() {
        let key_set: KeySet =
            serde_json::from_str(r#"{"keys": [{"kty": "RSA", "kid": "abc"}]}"#).unwrap();

        assert!(key_set.key_for("missing").is_none());
    }

    #[tokio::test]
    async fn test_cache_lookup_respects_url_key() {
        let cache: RwLock<Option<CachedDocument<u32>>> = RwLock::new(None);
        MetadataClient::cache_store(&cache, "https://a.example", 7, Duration::from_secs(60)).await;

        assert_eq!(
            MetadataClient::cache_lookup(&cache, "https://a.example").await,
            Some(7)
        );
        // A different URL is a miss even while the entry is fresh
        assert_eq!(
            MetadataClient::cache_lookup(&cache, "https://b.example").await,
            None
        );
    }

    #[tokio::test]
    async fn test_cache_lookup_expires() {
        let cache: RwLock<Option<CachedDocument<u32>>> = RwLock::new(None);
        MetadataClient::cache_store(&cache, "https://a.example", 7, Duration::from_millis(10))
            .await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(
            MetadataClient::cache_lookup(&cache, "https://a.example").await,
            None
        );
    }
}

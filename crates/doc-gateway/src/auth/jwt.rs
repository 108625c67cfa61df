//! Bearer-token verification against the configured issuer.
//!
//! Validates incoming JWTs using public keys published by the issuer: the
//! token's `kid` selects a key from the cached JWKS, the signature is checked
//! with the RS256 family, and `aud`/`iss`/`exp`/`nbf` are validated against
//! configuration. On success the full claim set becomes the request's
//! [`Principal`].
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Key lookup is by `kid`; trying every key would mask misconfiguration
//!   and waste work during issuer key rotation
//! - The token itself is never cached or logged

use crate::auth::metadata::{Jwk, MetadataClient};
use crate::auth::principal::Principal;
use crate::config::IssuerSettings;
use crate::errors::GatewayError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical tokens are well under 2KB; anything larger is rejected before
/// base64 decoding or signature work happens.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Signature algorithms always accepted alongside a key's declared `alg`.
///
/// Key metadata does not always carry `alg`, so the RS256 family is accepted
/// as a defensive superset.
const ACCEPTED_RSA_FAMILY: [Algorithm; 3] =
    [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Extract the `kid` (key ID) from a JWT header without verifying the
/// signature.
///
/// The `kid` is only used to look up the verification key in the trusted
/// key set; the token is still fully verified afterwards.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedToken`] when the token is oversized, not
/// three dot-separated segments, has an undecodable header, or carries no
/// usable `kid`.
pub fn extract_kid(token: &str) -> Result<String, GatewayError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "dg.auth.jwt",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(GatewayError::MalformedToken(
            "token exceeds maximum size".to_string(),
        ));
    }

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    let header_part = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => {
            tracing::debug!(target: "dg.auth.jwt", "Token rejected: not a three-segment JWT");
            return Err(GatewayError::MalformedToken(
                "token is not a valid JWT".to_string(),
            ));
        }
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "dg.auth.jwt", error = %e, "Failed to decode JWT header base64");
        GatewayError::MalformedToken("token header is not valid base64url".to_string())
    })?;

    let header: Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "dg.auth.jwt", error = %e, "Failed to parse JWT header JSON");
        GatewayError::MalformedToken("token header is not valid JSON".to_string())
    })?;

    // Empty kid is rejected: it could only ever match a malformed key entry
    header
        .get("kid")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| GatewayError::MalformedToken("token header missing kid".to_string()))
}

/// Bearer-token verifier for the configured issuer.
pub struct TokenVerifier {
    settings: IssuerSettings,
    metadata: Arc<MetadataClient>,
}

impl TokenVerifier {
    /// Create a verifier with its own metadata client.
    ///
    /// The metadata client (and its caches) is only ever constructed here,
    /// so no issuer traffic happens in shared-secret deployments.
    pub fn new(settings: IssuerSettings) -> Self {
        Self::with_metadata(settings, Arc::new(MetadataClient::new()))
    }

    /// Create a verifier sharing an existing metadata client (for tests).
    pub fn with_metadata(settings: IssuerSettings, metadata: Arc<MetadataClient>) -> Self {
        Self { settings, metadata }
    }

    /// Verify a bearer token and return the authenticated principal.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MalformedToken`] - token cannot be parsed (401)
    /// - [`GatewayError::MetadataFetch`] - discovery/JWKS retrieval failed (500)
    /// - [`GatewayError::SigningKeyNotFound`] - no key matches the token's
    ///   `kid`; legitimate during key rotation, no retry is performed (401)
    /// - [`GatewayError::InvalidToken`] - signature, audience, issuer, or
    ///   validity-window check failed (401)
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<Principal, GatewayError> {
        // 1. Extract kid from the unverified header
        let kid = extract_kid(token)?;

        // 2. Discovery document tells us where the key set lives
        let discovery = self
            .metadata
            .get_discovery(&self.settings.discovery_url)
            .await?;

        // 3. Fetch the key set
        let key_set = self.metadata.get_key_set(&discovery.jwks_uri).await?;

        // 4./5. First kid match wins; no match is a distinct failure so
        // rotation windows are distinguishable from bad tokens
        let jwk = key_set
            .key_for(&kid)
            .ok_or_else(|| GatewayError::SigningKeyNotFound(kid.clone()))?;

        // 6.-8. Verify signature and claims
        let claims = self.check_token(token, jwk)?;

        tracing::debug!(target: "dg.auth.jwt", "Token validated successfully");

        // 9. The full claim set is the principal
        Ok(Principal::from_claims(claims))
    }

    /// Verify the token's signature and claims against a selected key.
    fn check_token(&self, token: &str, jwk: &Jwk) -> Result<Map<String, Value>, GatewayError> {
        let (n, e) = match (jwk.n.as_deref(), jwk.e.as_deref()) {
            (Some(n), Some(e)) => (n, e),
            _ => {
                tracing::warn!(target: "dg.auth.jwt", kid = %jwk.kid, "Selected JWK is missing RSA material");
                return Err(GatewayError::InvalidToken(
                    "signing key has no usable RSA material".to_string(),
                ));
            }
        };

        let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
            tracing::warn!(target: "dg.auth.jwt", kid = %jwk.kid, error = %e, "Selected JWK has invalid RSA material");
            GatewayError::InvalidToken(format!("signing key is unusable: {}", e))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = accepted_algorithms(jwk.alg.as_deref());
        validation.set_audience(&[&self.settings.audience]);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.validate_nbf = true;
        // at_hash is deliberately not checked: it is not applicable to
        // access tokens.

        let data = decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(target: "dg.auth.jwt", error = %e, "Token verification failed");
                GatewayError::InvalidToken(e.to_string())
            })?;

        Ok(data.claims)
    }
}

/// Accepted signature algorithms for a key: its declared `alg` (when it
/// parses as one) plus the RS256 family.
fn accepted_algorithms(declared: Option<&str>) -> Vec<Algorithm> {
    let mut algorithms: Vec<Algorithm> = Vec::with_capacity(4);

    if let Some(alg) = declared.and_then(|s| s.parse::<Algorithm>().ok()) {
        algorithms.push(alg);
    }

    for alg in ACCEPTED_RSA_FAMILY {
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    algorithms
}

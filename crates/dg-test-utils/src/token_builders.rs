//! Builders for test tokens and issuer documents.

use crate::crypto_fixtures::TestRsaKey;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test JWTs.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("alice")
///     .with_audience("api://docgw")
///     .with_issuer("https://login.microsoftonline.com/t/v2.0")
///     .sign(&TestRsaKey::primary());
/// ```
pub struct TestTokenBuilder {
    sub: String,
    aud: String,
    iss: String,
    exp: i64,
    iat: i64,
    nbf: Option<i64>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a builder with a one-hour validity window and placeholder
    /// subject/audience/issuer.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            aud: "test-audience".to_string(),
            iss: "test-issuer".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            nbf: None,
            extra: Map::new(),
        }
    }

    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = audience.to_string();
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for already expired).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set a not-before claim in seconds from now.
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Attach an arbitrary extra claim.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value.
    pub fn build_claims(&self) -> Value {
        let mut claims = json!({
            "sub": self.sub,
            "aud": self.aud,
            "iss": self.iss,
            "exp": self.exp,
            "iat": self.iat,
        });
        if let Some(nbf) = self.nbf {
            claims["nbf"] = json!(nbf);
        }
        if let Some(object) = claims.as_object_mut() {
            for (name, value) in &self.extra {
                object.insert(name.clone(), value.clone());
            }
        }
        claims
    }

    /// Sign with the fixture key, stamping its kid into the header.
    pub fn sign(&self, key: &TestRsaKey) -> String {
        self.sign_with_kid(key, key.kid)
    }

    /// Sign with the fixture key but an arbitrary header kid.
    pub fn sign_with_kid(&self, key: &TestRsaKey, kid: &str) -> String {
        sign_claims(&self.build_claims(), &key.encoding_key(), kid)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign arbitrary claims as an RS256 JWT.
pub fn sign_claims(claims: &Value, encoding_key: &EncodingKey, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    header.kid = Some(kid.to_string());

    encode(&header, claims, encoding_key).expect("Failed to sign test token")
}

/// A JWKS body publishing the given JWK entries in order.
pub fn jwks_json(keys: &[Value]) -> Value {
    json!({ "keys": keys })
}

/// A minimal OIDC discovery document pointing at the given JWKS URL.
pub fn discovery_json(issuer: &str, jwks_uri: &str) -> Value {
    json!({
        "issuer": issuer,
        "jwks_uri": jwks_uri,
        "token_endpoint": format!("{}/oauth2/v2.0/token", issuer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_valid_claims() {
        let claims = TestTokenBuilder::new()
            .for_subject("alice")
            .with_audience("api://docgw")
            .with_issuer("https://issuer.example/t/v2.0")
            .build_claims();

        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["aud"], "api://docgw");
        assert_eq!(claims["iss"], "https://issuer.example/t/v2.0");
        assert!(claims["exp"].as_i64().unwrap() > claims["iat"].as_i64().unwrap());
        assert!(claims.get("nbf").is_none());
    }

    #[test]
    fn test_builder_extra_claims() {
        let claims = TestTokenBuilder::new()
            .with_claim("scp", json!("documents.read"))
            .build_claims();

        assert_eq!(claims["scp"], "documents.read");
    }

    #[test]
    fn test_sign_produces_three_segments() {
        let token = TestTokenBuilder::new().sign(&TestRsaKey::primary());
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_discovery_json_shape() {
        let doc = discovery_json("https://issuer.example/t/v2.0", "https://issuer.example/keys");
        assert_eq!(doc["jwks_uri"], "https://issuer.example/keys");
        assert_eq!(doc["issuer"], "https://issuer.example/t/v2.0");
    }

    #[test]
    fn test_jwks_json_preserves_order() {
        let jwks = jwks_json(&[
            TestRsaKey::primary().jwk(),
            TestRsaKey::secondary().jwk(),
        ]);

        assert_eq!(jwks["keys"][0]["kid"], "test-key-01");
        assert_eq!(jwks["keys"][1]["kid"], "test-key-02");
    }
}

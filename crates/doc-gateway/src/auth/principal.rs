//! Authenticated principal.
//!
//! The verified result of authentication, created per-request and carried in
//! request extensions until the request ends. Never persisted. The subject is
//! redacted in Debug output to keep identifiers out of logs.

use serde_json::{Map, Value};
use std::fmt;

/// Subject assigned to shared-secret callers.
pub const API_KEY_SUBJECT: &str = "api-key-user";

/// How a principal was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Issuer-signed bearer token.
    Bearer,
    /// Static shared secret.
    ApiKey,
}

impl AuthMethod {
    /// Stable label for logs, metrics, and wire responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Bearer => "bearer",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

/// The authenticated identity resolved from a request's credentials.
///
/// For bearer auth this carries the full issuer-asserted claim set; for
/// shared-secret auth it is a synthetic minimal record.
#[derive(Clone)]
pub struct Principal {
    subject: String,
    method: AuthMethod,
    claims: Map<String, Value>,
}

/// Custom Debug implementation that redacts the subject.
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("subject", &"[REDACTED]")
            .field("method", &self.method)
            .field("claims", &self.claims.len())
            .finish()
    }
}

impl Principal {
    /// Build a principal from a verified bearer-token claim set.
    ///
    /// The subject is taken from the `sub` claim; tokens without one yield an
    /// empty subject but keep their full claim set.
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            subject,
            method: AuthMethod::Bearer,
            claims,
        }
    }

    /// The synthetic principal for shared-secret callers.
    pub fn api_key() -> Self {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::String(API_KEY_SUBJECT.to_string()));
        claims.insert("auth".to_string(), Value::String("api_key".to_string()));

        Self {
            subject: API_KEY_SUBJECT.to_string(),
            method: AuthMethod::ApiKey,
            claims,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }

    /// The full claim set backing this principal.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Look up a single claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

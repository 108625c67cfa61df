//! Authentication for the Document Gateway.
//!
//! Two mutually exclusive verification modes, selected by configuration at
//! startup:
//!
//! - **Token issuer**: `Authorization: Bearer <token>` validated against the
//!   issuer's published key set ([`jwt::TokenVerifier`]).
//! - **Shared secret**: a configurable header compared against a static
//!   secret ([`api_key::ApiKeyVerifier`]).
//!
//! The [`Authenticator`] is the mediator: it extracts the credential from
//! the request headers and dispatches to the mode's verifier. The mode is a
//! typed enum built from validated configuration, so an unsupported mode is
//! unrepresentable at request time.

pub mod api_key;
pub mod jwt;
pub mod metadata;
pub mod principal;

pub use api_key::ApiKeyVerifier;
pub use jwt::TokenVerifier;
pub use metadata::MetadataClient;
pub use principal::{AuthMethod, Principal};

use crate::config::AuthSettings;
use crate::errors::GatewayError;
use axum::http::HeaderMap;
use tracing::instrument;

/// Strategy selector over the configured verification mode.
pub enum Authenticator {
    /// Issuer-signed bearer tokens.
    Bearer(TokenVerifier),
    /// Static shared secret.
    ApiKey(ApiKeyVerifier),
}

impl Authenticator {
    /// Build the authenticator for the configured mode.
    ///
    /// The issuer metadata client only exists in the `Bearer` arm, so
    /// shared-secret deployments perform no issuer traffic at all.
    pub fn from_settings(settings: &AuthSettings) -> Self {
        match settings {
            AuthSettings::TokenIssuer(issuer) => {
                Authenticator::Bearer(TokenVerifier::new(issuer.clone()))
            }
            AuthSettings::SharedSecret(api_key) => {
                Authenticator::ApiKey(ApiKeyVerifier::new(api_key.clone()))
            }
        }
    }

    /// Authenticate a request from its headers.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] from the mode's verifier, plus
    /// [`GatewayError::MissingCredentials`] when bearer mode sees no usable
    /// `Authorization` header.
    #[instrument(skip_all, fields(method = self.method().as_str()))]
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, GatewayError> {
        match self {
            Authenticator::Bearer(verifier) => {
                let token = extract_bearer_token(headers)?;
                verifier.verify(token).await
            }
            Authenticator::ApiKey(verifier) => {
                // HeaderMap lookups are case-insensitive; the configured name
                // is stored lowercase.
                let provided = headers
                    .get(verifier.header_name())
                    .and_then(|v| v.to_str().ok());
                verifier.verify(provided)
            }
        }
    }

    /// The authentication method this authenticator produces.
    pub fn method(&self) -> AuthMethod {
        match self {
            Authenticator::Bearer(_) => AuthMethod::Bearer,
            Authenticator::ApiKey(_) => AuthMethod::ApiKey,
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme match is case-insensitive. Anything else — no header, a
/// non-bearer scheme, an empty token — is [`GatewayError::MissingCredentials`],
/// which carries the bearer challenge in its response.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, GatewayError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "dg.auth", "Missing Authorization header");
            GatewayError::MissingCredentials
        })?;

    let (scheme, token) = header.split_once(' ').ok_or_else(|| {
        tracing::debug!(target: "dg.auth", "Authorization header has no scheme separator");
        GatewayError::MissingCredentials
    })?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "dg.auth", "Authorization header uses a non-bearer scheme");
        return Err(GatewayError::MissingCredentials);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(GatewayError::MissingCredentials);
    }

    Ok(token)
}

//! Shared-secret (API key) verification.
//!
//! Compares the caller-provided header value against the configured secret
//! using a constant-time comparison, so response timing does not leak how
//! much of the secret matched.

use crate::auth::principal::Principal;
use crate::config::ApiKeySettings;
use crate::errors::GatewayError;
use ring::constant_time;
use secrecy::ExposeSecret;

/// Verifier for the static shared secret.
pub struct ApiKeyVerifier {
    settings: ApiKeySettings,
}

impl ApiKeyVerifier {
    pub fn new(settings: ApiKeySettings) -> Self {
        Self { settings }
    }

    /// Name of the header the secret is expected in (lowercase).
    pub fn header_name(&self) -> &str {
        &self.settings.header
    }

    /// Verify a provided secret value.
    ///
    /// Missing, empty, or mismatched values fail with
    /// [`GatewayError::InvalidCredential`]; a match yields the synthetic
    /// API-key principal.
    pub fn verify(&self, provided: Option<&str>) -> Result<Principal, GatewayError> {
        let provided = match provided {
            Some(value) if !value.is_empty() => value,
            _ => {
                tracing::debug!(target: "dg.auth.api_key", "No API key presented");
                return Err(GatewayError::InvalidCredential);
            }
        };

        let expected = self.settings.value.expose_secret();
        if constant_time::verify_slices_are_equal(provided.as_bytes(), expected.as_bytes())
            .is_err()
        {
            tracing::debug!(target: "dg.auth.api_key", "API key mismatch");
            return Err(GatewayError::InvalidCredential);
        }

        Ok(Principal::api_key())
    }
}

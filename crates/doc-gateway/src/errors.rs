//! Document Gateway error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl:
//! authentication failures are 401, issuer metadata failures are 500 (an
//! unreachable issuer is an operational fault, not a client error), store
//! lookups are 404/409, store faults are 500. Bearer-mode 401 responses carry
//! a `WWW-Authenticate: Bearer` challenge; API-key failures do not.
//!
//! Every failure is terminal for the current request. There is no retry
//! logic anywhere in this service; transient failures (key rotation, network
//! blips) are resolved by the caller issuing a fresh request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Document Gateway error type.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bearer token could not be parsed at all.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// No key in the current key set matches the token's `kid`. Often
    /// transient during issuer key rotation; the caller may retry with a
    /// fresh request.
    #[error("Signing key not found")]
    SigningKeyNotFound(String),

    /// Signature, audience, issuer, or validity-window check failed.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// No credential was presented in the expected form.
    #[error("Missing or invalid Authorization header")]
    MissingCredentials,

    /// Shared secret absent or mismatched.
    #[error("Invalid or missing API key")]
    InvalidCredential,

    /// Discovery document or key set retrieval failed.
    #[error("Metadata fetch failed: {0}")]
    MetadataFetch(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::MalformedToken(_)
            | GatewayError::SigningKeyNotFound(_)
            | GatewayError::InvalidToken(_)
            | GatewayError::MissingCredentials
            | GatewayError::InvalidCredential => 401,
            GatewayError::MetadataFetch(_) | GatewayError::Database(_) => 500,
            GatewayError::NotFound(_) => 404,
            GatewayError::Conflict(_) => 409,
        }
    }

    /// Whether a 401 response for this error carries the bearer challenge.
    fn bearer_challenge(&self) -> bool {
        matches!(
            self,
            GatewayError::MalformedToken(_)
                | GatewayError::SigningKeyNotFound(_)
                | GatewayError::InvalidToken(_)
                | GatewayError::MissingCredentials
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let challenge = self.bearer_challenge();

        let (status, code, message) = match &self {
            GatewayError::MalformedToken(reason) => (
                StatusCode::UNAUTHORIZED,
                "MALFORMED_TOKEN",
                format!("Malformed token: {}", reason),
            ),
            GatewayError::SigningKeyNotFound(kid) => {
                // Expected during key rotation; log the kid server-side only
                tracing::warn!(target: "dg.auth", kid = %kid, "Signing key not found in key set");
                (
                    StatusCode::UNAUTHORIZED,
                    "SIGNING_KEY_NOT_FOUND",
                    "Signing key not found".to_string(),
                )
            }
            GatewayError::InvalidToken(reason) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                format!("Invalid token: {}", reason),
            ),
            GatewayError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "MISSING_CREDENTIALS",
                "Missing or invalid Authorization header".to_string(),
            ),
            GatewayError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                "Invalid or missing API key".to_string(),
            ),
            GatewayError::MetadataFetch(reason) => {
                tracing::error!(target: "dg.auth.metadata", reason = %reason, "Issuer metadata fetch failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "METADATA_FETCH_FAILED",
                    reason.clone(),
                )
            }
            GatewayError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "dg.store", error = %err, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            GatewayError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            GatewayError::Conflict(reason) => (StatusCode::CONFLICT, "CONFLICT", reason.clone()),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Advertise the expected scheme on bearer-mode 401s
        if challenge {
            if let Ok(header_value) = "Bearer".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert sqlx errors to GatewayError
impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        GatewayError::Database(err.to_string())
    }
}

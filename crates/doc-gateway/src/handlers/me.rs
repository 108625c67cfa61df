//! Current principal handler.
//!
//! Returns the authenticated principal bound by the auth middleware — useful
//! for callers debugging their credentials and for verifying the context
//! binding end to end.

use crate::auth::Principal;
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

/// Response for `GET /v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Subject of the authenticated principal.
    pub sub: String,

    /// How the caller authenticated ("bearer" or "api_key").
    pub method: String,

    /// The full claim set backing the principal.
    pub claims: Map<String, Value>,
}

/// Handler for GET /v1/me
///
/// Requires authentication; the principal comes from request extensions.
#[instrument(skip_all, name = "dg.handlers.me")]
pub async fn get_me(Extension(principal): Extension<Principal>) -> Json<MeResponse> {
    Json(MeResponse {
        sub: principal.subject().to_string(),
        method: principal.method().as_str().to_string(),
        claims: principal.claims().clone(),
    })
}

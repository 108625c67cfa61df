//! Data models and wire DTOs.

use serde::{Deserialize, Serialize};

/// A user record in the document store, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Body for `PUT /v1/users/{id}`; the id comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertUserRequest {
    pub name: String,
    pub email: String,
}

/// Response for `GET /v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" if the store is reachable, "unhealthy" otherwise.
    pub status: String,

    /// Configured authentication mode.
    pub auth_mode: String,

    /// Store connectivity ("healthy" / "unhealthy").
    pub store: String,
}

//! User record handlers.
//!
//! Thin field-mapping wrappers around the store:
//!
//! - `GET /v1/users/{id}` - read one record
//! - `GET /v1/users` - list records
//! - `POST /v1/users` - create a record (409 on duplicate id)
//! - `PUT /v1/users/{id}` - create or replace a record
//!
//! All endpoints sit behind the auth middleware; the principal is already
//! bound when these run.

use crate::auth::Principal;
use crate::errors::GatewayError;
use crate::models::{UpsertUserRequest, User};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /v1/users/{id}
#[instrument(skip(state), name = "dg.handlers.users.get", fields(user_id = %id))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, GatewayError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("User {} not found", id)))
}

/// Handler for GET /v1/users
#[instrument(skip_all, name = "dg.handlers.users.list")]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, GatewayError> {
    let users = state.store.list().await?;
    Ok(Json(users))
}

/// Handler for POST /v1/users
///
/// Returns 201 with the stored record, or 409 when the id already exists.
#[instrument(skip(state, principal, user), name = "dg.handlers.users.create")]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(user): Json<User>,
) -> Result<(StatusCode, Json<User>), GatewayError> {
    tracing::info!(
        target: "dg.handlers.users",
        auth_method = principal.method().as_str(),
        user_id = %user.id,
        "Creating user"
    );

    let created = state.store.create(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for PUT /v1/users/{id}
///
/// Creates or replaces the record at the path id.
#[instrument(skip(state, principal, body), name = "dg.handlers.users.upsert", fields(user_id = %id))]
pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<UpsertUserRequest>,
) -> Result<Json<User>, GatewayError> {
    tracing::info!(
        target: "dg.handlers.users",
        auth_method = principal.method().as_str(),
        user_id = %id,
        "Upserting user"
    );

    let user = state
        .store
        .upsert(User {
            id,
            name: body.name,
            email: body.email,
        })
        .await?;

    Ok(Json(user))
}

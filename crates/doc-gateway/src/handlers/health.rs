//! Health check handler.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /v1/health
///
/// Public liveness probe: pings the store and reports status. Always returns
/// 200 so orchestrators see the response body even when the store is down.
#[instrument(skip_all, name = "dg.handlers.health")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_healthy = state.store.ping().await;

    let label = |healthy: bool| {
        if healthy { "healthy" } else { "unhealthy" }.to_string()
    };

    Json(HealthResponse {
        status: label(store_healthy),
        auth_mode: state.config.auth.mode().to_string(),
        store: label(store_healthy),
    })
}

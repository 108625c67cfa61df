//! HTTP routes for the Document Gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::Authenticator;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{require_auth, AuthState};
use crate::repositories::UserStore;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store client.
    pub store: Arc<dyn UserStore>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/v1/health` - Store health probe (public)
/// - `/v1/me` - Authenticated principal echo
/// - `/v1/users`, `/v1/users/{id}` - Record CRUD (authenticated)
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>) -> Router {
    // The authenticator is built once per process from validated settings;
    // issuer metadata caches live inside it for the process lifetime.
    let auth_state = AuthState {
        authenticator: Arc::new(Authenticator::from_settings(&state.config.auth)),
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .with_state(state.clone());

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/v1/me", get(handlers::get_me))
        .route("/v1/users", get(handlers::list_users).post(handlers::create_user))
        .route("/v1/users/:id", get(handlers::get_user).put(handlers::upsert_user))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

//! Document Gateway Service Library
//!
//! A thin API gateway exposing CRUD operations on a managed document store,
//! gated by pluggable authentication:
//!
//! - Bearer tokens signed by a trusted third-party issuer (validated against
//!   the issuer's published key set, fetched and cached via OIDC discovery)
//! - A static shared secret in a configurable header
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//!                        |
//!                   auth/*.rs (mode-specific verification)
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `auth` - Credential verification and issuer metadata caching
//! - `middleware` - Authentication middleware and principal binding
//! - `handlers` - HTTP request handlers
//! - `models` - Data models
//! - `repositories` - Document store access
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;

//! Gateway server harness for integration tests.
//!
//! Spawns the real router with an in-memory store on an ephemeral port, so
//! tests drive it over HTTP exactly like a deployed instance. Issuer
//! endpoints are mocked separately (with `wiremock`) and pointed at via the
//! `AAD_OPENID_CONFIG` override.

use anyhow::Result;
use doc_gateway::config::Config;
use doc_gateway::repositories::{MemoryUserStore, UserStore};
use doc_gateway::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A running gateway instance backed by an in-memory store.
pub struct TestGateway {
    addr: SocketAddr,
    server_handle: JoinHandle<()>,
}

impl TestGateway {
    /// Spawn a gateway configured from the given variables.
    ///
    /// `DATABASE_URL` is injected automatically (the in-memory store never
    /// dials it); everything else comes from `vars`.
    pub async fn spawn(vars: HashMap<String, String>) -> Result<Self> {
        Self::spawn_with_store(vars, Arc::new(MemoryUserStore::new())).await
    }

    /// Spawn a gateway over a caller-provided store.
    pub async fn spawn_with_store(
        mut vars: HashMap<String, String>,
        store: Arc<dyn UserStore>,
    ) -> Result<Self> {
        vars.entry("DATABASE_URL".to_string())
            .or_insert_with(|| "postgresql://unused/test".to_string());

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState { store, config });
        let app = routes::build_routes(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            server_handle,
        })
    }

    /// Base URL of the running instance.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Variables for an API-key-mode gateway.
pub fn api_key_vars(secret: &str) -> HashMap<String, String> {
    HashMap::from([
        ("AUTH_MODE".to_string(), "API_KEY".to_string()),
        ("API_KEY_VALUE".to_string(), secret.to_string()),
    ])
}

/// Variables for an AAD-mode gateway pointed at a mocked issuer.
pub fn aad_vars(audience: &str, issuer: &str, discovery_url: &str) -> HashMap<String, String> {
    HashMap::from([
        ("AUTH_MODE".to_string(), "AAD".to_string()),
        ("AAD_TENANT_ID".to_string(), "test-tenant".to_string()),
        ("AAD_AUDIENCE".to_string(), audience.to_string()),
        ("AAD_ISSUER".to_string(), issuer.to_string()),
        ("AAD_OPENID_CONFIG".to_string(), discovery_url.to_string()),
    ])
}

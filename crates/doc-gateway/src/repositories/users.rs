//! User store implementations.
//!
//! The gateway talks to its document store through the [`UserStore`] trait so
//! handlers stay independent of the backing engine. [`PostgresUserStore`] is
//! the production implementation; [`MemoryUserStore`] backs tests and local
//! development.
//!
//! All queries use parameterized statements.

use crate::errors::GatewayError;
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

/// Document-store operations the gateway needs, keyed by the `id` field.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Read a user by id. `Ok(None)` when absent.
    async fn get(&self, id: &str) -> Result<Option<User>, GatewayError>;

    /// List all users, ordered by id.
    async fn list(&self) -> Result<Vec<User>, GatewayError>;

    /// Create a new user. Fails with [`GatewayError::Conflict`] when the id
    /// already exists.
    async fn create(&self, user: User) -> Result<User, GatewayError>;

    /// Create or replace a user.
    async fn upsert(&self, user: User) -> Result<User, GatewayError>;

    /// Connectivity check for health probes.
    async fn ping(&self) -> bool;
}

/// Postgres-backed user store.
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table when it does not exist yet.
    ///
    /// Run once at startup; the store is usable immediately afterwards.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!(target: "dg.store", "User table ready");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn get(&self, id: &str) -> Result<Option<User>, GatewayError> {
        let user: Option<User> =
            sqlx::query_as("SELECT id, name, email FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, GatewayError> {
        let users: Vec<User> = sqlx::query_as("SELECT id, name, email FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn create(&self, user: User) -> Result<User, GatewayError> {
        let result = sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                GatewayError::Conflict(format!("User {} already exists", user.id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert(&self, user: User) -> Result<User, GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

/// In-memory user store for tests and local development.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: &str) -> Result<Option<User>, GatewayError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, GatewayError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn create(&self, user: User) -> Result<User, GatewayError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(GatewayError::Conflict(format!(
                "User {} already exists",
                user.id
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn upsert(&self, user: User) -> Result<User, GatewayError> {
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn ping(&self) -> bool {
        true
    }
}

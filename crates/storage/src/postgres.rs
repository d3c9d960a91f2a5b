use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::{round_rating, Credential, CredentialStore, Result, Table, UserSummary};

/// Credential store backed by a Postgres connection pool.
///
/// The pool is owned by the store and handed in by whoever builds the
/// application; cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_credential(&self, table: Table, name: &str, password_hash: &str) -> Result<i32> {
        let sql = format!(
            "INSERT INTO {} (name, password) VALUES ($1, $2) RETURNING id",
            table.name()
        );

        let id = sqlx::query_scalar::<_, i32>(&sql)
            .bind(name)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;

        debug!(table = table.name(), id, "inserted credential");
        Ok(id)
    }

    async fn find_credential(&self, table: Table, name: &str) -> Result<Option<Credential>> {
        let sql = format!("SELECT id, name, password FROM {} WHERE name = $1", table.name());

        let credential = sqlx::query_as::<_, Credential>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(credential)
    }

    async fn count_credentials(&self, table: Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        // NUMERIC comes back as text from some drivers; cast so the row decodes as f64
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, rating::float8 AS rating FROM auth ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update_rating(&self, id: i32, rating: f64) -> Result<Option<UserSummary>> {
        let user = sqlx::query_as::<_, UserSummary>(
            "UPDATE auth SET rating = ROUND($1::numeric, 2) WHERE id = $2 \
             RETURNING id, name, rating::float8 AS rating",
        )
        .bind(round_rating(rating))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

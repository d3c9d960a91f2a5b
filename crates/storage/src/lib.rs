//! Credential storage for ProxLib
//!
//! Provides:
//! - The `CredentialStore` trait the auth and admin services are written against
//! - A Postgres implementation over a `sqlx` pool
//! - Schema migrations for the `auth`, `admin` and `profile` tables
//! - An in-memory implementation (feature `memory`)

pub mod migrations;
pub mod model;
pub mod postgres;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use model::{Credential, UserSummary};
pub use postgres::PgCredentialStore;

#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Credential table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Regular users (`auth`)
    Users,
    /// Administrators (`admin`)
    Admins,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "auth",
            Table::Admins => "admin",
        }
    }
}

/// Durable store for user and administrator credentials.
///
/// Every method is a single statement against the backing store; no
/// operation spans a transaction.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential row and return its generated id.
    ///
    /// Fails with `StoreError::UniqueViolation` when `name` is taken.
    async fn insert_credential(&self, table: Table, name: &str, password_hash: &str) -> Result<i32>;

    /// Look up a credential row by its unique name
    async fn find_credential(&self, table: Table, name: &str) -> Result<Option<Credential>>;

    async fn count_credentials(&self, table: Table) -> Result<i64>;

    /// All users ordered by id ascending
    async fn list_users(&self) -> Result<Vec<UserSummary>>;

    /// Set a user's rating, returning the updated row or `None` if the id is unknown
    async fn update_rating(&self, id: i32, rating: f64) -> Result<Option<UserSummary>>;

    /// Delete a user, returning `false` if the id is unknown.
    ///
    /// Dependent rows go with it through cascading foreign keys.
    async fn delete_user(&self, id: i32) -> Result<bool>;
}

/// Round a rating to the two decimal places the schema stores
pub fn round_rating(rating: f64) -> f64 {
    (rating * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(Table::Users.name(), "auth");
        assert_eq!(Table::Admins.name(), "admin");
    }

    #[test]
    fn test_round_rating() {
        assert_eq!(round_rating(4.5), 4.5);
        assert_eq!(round_rating(4.567), 4.57);
        assert_eq!(round_rating(3.141), 3.14);
        assert_eq!(round_rating(0.0), 0.0);
    }
}

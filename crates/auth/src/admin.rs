use std::sync::Arc;

use storage::{CredentialStore, StoreError, UserSummary};
use tracing::info;

use crate::error::{AuthError, Result};

/// Largest rating the `NUMERIC(6, 2)` column holds
pub const MAX_RATING: f64 = 9999.99;

/// User management for administrators.
///
/// Callers are expected to have checked an admin token first; the HTTP
/// layer does this in middleware.
pub struct AdminService {
    store: Arc<dyn CredentialStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// All users ordered by id
    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        Ok(self.store.list_users().await?)
    }

    /// Set a user's rating, stored rounded to two decimal places
    pub async fn update_rating(&self, id: i32, new_rating: f64) -> Result<UserSummary> {
        if !new_rating.is_finite() || new_rating < 0.0 {
            return Err(AuthError::Validation(
                "Rating must be a non-negative number".to_string(),
            ));
        }
        if new_rating > MAX_RATING {
            return Err(AuthError::Validation(format!(
                "Rating must not exceed {MAX_RATING}"
            )));
        }

        // -0.0 passes the sign check; store it as 0
        let new_rating = new_rating.abs();

        let user = self
            .store
            .update_rating(id, new_rating)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        info!(user_id = id, rating = user.rating, "updated rating");
        Ok(user)
    }

    /// Delete a user; dependent rows are removed by cascading foreign keys
    pub async fn delete_user(&self, id: i32) -> Result<i32> {
        let deleted = self.store.delete_user(id).await.map_err(|e| match e {
            StoreError::ForeignKeyViolation(_) => AuthError::Conflict(
                "User has dependent records and cannot be deleted".to_string(),
            ),
            other => AuthError::Store(other),
        })?;

        if !deleted {
            return Err(AuthError::NotFound("User not found".to_string()));
        }

        info!(user_id = id, "deleted user");
        Ok(id)
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored credential row from either the `auth` or the `admin` table
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// Public view of a user as listed to administrators.
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub rating: f64,
}

impl UserSummary {
    pub fn new(id: i32, name: impl Into<String>, rating: f64) -> Self {
        Self {
            id,
            name: name.into(),
            rating,
        }
    }
}

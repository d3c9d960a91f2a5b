use serde::{Deserialize, Serialize};

/// Role carried in a session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user; tokens for users carry no role claim
    #[default]
    User,
    /// Administrator, authenticated against the `admin` table
    Admin,
}

impl Role {
    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub user_id: i32,
    pub token: String,
}

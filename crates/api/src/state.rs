use std::sync::Arc;

use auth::{AdminService, AuthService};
use storage::CredentialStore;

/// Application state shared across all handlers
pub struct AppState {
    pub auth_service: AuthService,
    pub admin_service: AdminService,
}

impl AppState {
    pub fn new(auth_service: AuthService, admin_service: AdminService) -> Self {
        Self {
            auth_service,
            admin_service,
        }
    }

    /// Build both services over one shared store
    pub fn from_store(store: Arc<dyn CredentialStore>, jwt_secret: String, token_expiry_seconds: i64) -> Self {
        Self::new(
            AuthService::new(store.clone(), jwt_secret, token_expiry_seconds),
            AdminService::new(store),
        )
    }
}

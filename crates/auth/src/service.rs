use std::sync::Arc;

use storage::{CredentialStore, StoreError, Table};
use tracing::{info, warn};

use crate::{
    error::{AuthError, Result},
    jwt::{generate_token, validate_token, Claims},
    model::{AuthToken, Role},
    password::{hash_password_blocking, verify_password_blocking},
};

/// Authentication service: registration, logins and token verification
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt_secret: String,
    token_expiry_seconds: i64,
}

impl AuthService {
    /// Create a new AuthService
    ///
    /// # Arguments
    /// * `store` - Credential store shared with the admin service
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `token_expiry_seconds` - Lifetime of issued tokens
    pub fn new(store: Arc<dyn CredentialStore>, jwt_secret: String, token_expiry_seconds: i64) -> Self {
        Self {
            store,
            jwt_secret,
            token_expiry_seconds,
        }
    }

    /// Register a new user and return its id.
    ///
    /// The password hash never leaves the service.
    pub async fn register(&self, name: &str, password: &str) -> Result<i32> {
        require_credentials(name, password, "Name and password required")?;

        let id = self
            .create_credential(Table::Users, name, password, "User with this name already exists")
            .await?;

        info!(user_id = id, name, "registered user");
        Ok(id)
    }

    /// Log a user in and return a signed token carrying `{id, name}`.
    ///
    /// Unknown names and wrong passwords fail with the same error.
    pub async fn login(&self, name: &str, password: &str) -> Result<AuthToken> {
        require_credentials(name, password, "Name and password required")?;

        self.authenticate(Table::Users, name, password, Role::User, AuthError::InvalidCredentials)
            .await
    }

    /// Log an administrator in against the `admin` table; the token carries `role: admin`
    pub async fn admin_login(&self, name: &str, password: &str) -> Result<AuthToken> {
        require_credentials(name, password, "Admin name and password required")?;

        self.authenticate(
            Table::Admins,
            name,
            password,
            Role::Admin,
            AuthError::InvalidAdminCredentials,
        )
        .await
    }

    /// Create an administrator account. Not reachable over HTTP.
    pub async fn create_admin(&self, name: &str, password: &str) -> Result<i32> {
        require_credentials(name, password, "Admin name and password required")?;

        let id = self
            .create_credential(Table::Admins, name, password, "Admin with this name already exists")
            .await?;

        info!(admin_id = id, name, "created admin");
        Ok(id)
    }

    pub async fn admin_count(&self) -> Result<i64> {
        Ok(self.store.count_credentials(Table::Admins).await?)
    }

    /// Verify a token's signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims> {
        validate_token(token, &self.jwt_secret)
    }

    /// Verify a token and require the admin role
    pub fn verify_admin(&self, token: &str) -> Result<Claims> {
        let claims = self.verify(token)?;

        if !claims.role.is_admin() {
            return Err(AuthError::Forbidden);
        }

        Ok(claims)
    }

    async fn create_credential(
        &self,
        table: Table,
        name: &str,
        password: &str,
        conflict_message: &str,
    ) -> Result<i32> {
        let password_hash = hash_password_blocking(password.to_string()).await?;

        self.store
            .insert_credential(table, name, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AuthError::Conflict(conflict_message.to_string()),
                other => AuthError::Store(other),
            })
    }

    async fn authenticate(
        &self,
        table: Table,
        name: &str,
        password: &str,
        role: Role,
        failure: AuthError,
    ) -> Result<AuthToken> {
        let Some(credential) = self.store.find_credential(table, name).await? else {
            warn!(table = table.name(), name, "login for unknown name");
            return Err(failure);
        };

        if !verify_password_blocking(password.to_string(), credential.password_hash).await? {
            warn!(table = table.name(), name, "login with wrong password");
            return Err(failure);
        }

        let token = generate_token(
            credential.id,
            &credential.name,
            role,
            &self.jwt_secret,
            self.token_expiry_seconds,
        )?;

        info!(table = table.name(), id = credential.id, name, "login succeeded");
        Ok(AuthToken {
            user_id: credential.id,
            token,
        })
    }
}

fn require_credentials(name: &str, password: &str, message: &str) -> Result<()> {
    if name.trim().is_empty() || password.is_empty() {
        return Err(AuthError::Validation(message.to_string()));
    }
    Ok(())
}

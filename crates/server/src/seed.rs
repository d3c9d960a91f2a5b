use auth::{AuthService, Result};
use proxlib_core::AuthConfig;
use tracing::info;

/// Create the configured admin account when the admin table is empty.
///
/// Returns the id of the created admin, or `None` when nothing was seeded.
pub async fn seed_admin(auth_service: &AuthService, config: &AuthConfig) -> Result<Option<i32>> {
    let (Some(name), Some(password)) = (&config.seed_admin_name, &config.seed_admin_password) else {
        return Ok(None);
    };

    let count = auth_service.admin_count().await?;
    if count > 0 {
        info!(count, "admin account(s) already exist, skipping seed");
        return Ok(None);
    }

    let id = auth_service.create_admin(name, password).await?;
    info!(admin_id = id, name = %name, "seeded admin account");

    Ok(Some(id))
}

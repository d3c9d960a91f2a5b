use chrono::{TimeDelta, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::model::Role;

/// JWT Claims structure
///
/// Same payload shape as tokens minted by the previous deployment:
/// `{id, name, role?, iat, exp}` with `role` present only for admins.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Row id in the `auth` or `admin` table
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Role::is_user")]
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims expiring `expires_in_seconds` from now.
    ///
    /// Fails when the expiry is not representable as a timestamp.
    pub fn new(id: i32, name: String, role: Role, expires_in_seconds: i64) -> Result<Self> {
        let now = Utc::now();
        let expiration = TimeDelta::try_seconds(expires_in_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::TokenGenerationError(format!("token expiry of {expires_in_seconds}s is out of range"))
            })?;

        Ok(Self {
            id,
            name,
            role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        })
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Sign a token for an authenticated identity
///
/// # Arguments
/// * `id` - The user or admin id
/// * `name` - The account name
/// * `role` - The account's role
/// * `secret` - The secret key for signing the token
/// * `expires_in_seconds` - Token lifetime in seconds (e.g., 3600 for 1 hour)
pub fn generate_token(
    id: i32,
    name: &str,
    role: Role,
    secret: &str,
    expires_in_seconds: i64,
) -> Result<String> {
    let claims = Claims::new(id, name.to_string(), role, expires_in_seconds)?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
}

/// Validate a JWT token and return the claims
///
/// Fails with `TokenExpired` once `exp` has passed (no leeway) and with
/// `InvalidToken` for anything that does not verify.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    let claims = token_data.claims;

    if claims.is_expired() {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

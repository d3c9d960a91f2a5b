use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::{ApiError, AppState};
use auth::Claims;

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid Authorization header".to_string()))
}

/// Middleware gating every admin route.
///
/// The token must verify (signature and expiry) and carry `role: admin`.
/// Verified claims are stored in the request extensions for handlers.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;

    let claims = state.auth_service.verify_admin(token).map_err(|e| {
        warn!(path = %request.uri().path(), error = %e, "rejected admin request");
        ApiError::from_auth(e, "Authorization failed")
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extractor for the verified admin claims
/// Use this in handlers that are protected by `require_admin`
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl<S> FromRequestParts<S> for AdminClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AdminClaims)
            .ok_or_else(|| ApiError::Unauthorized("Admin not authenticated".to_string()))
    }
}

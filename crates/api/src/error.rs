//! HTTP error type and its mapping from service errors.
use auth::AuthError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Carries only the message shown to the client; the cause is logged where it is created
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a service error, hiding server-side failures behind `context`
    pub fn from_auth(err: AuthError, context: &str) -> Self {
        match err {
            AuthError::Validation(message) => ApiError::BadRequest(message),
            AuthError::Conflict(message) => ApiError::Conflict(message),
            AuthError::NotFound(message) => ApiError::NotFound(message),
            AuthError::InvalidCredentials
            | AuthError::InvalidAdminCredentials
            | AuthError::TokenExpired
            | AuthError::InvalidToken => ApiError::Unauthorized(err.to_string()),
            AuthError::Forbidden => ApiError::Forbidden("Access denied. Admin role required".to_string()),
            AuthError::HashingError(_)
            | AuthError::VerificationError
            | AuthError::TokenGenerationError(_)
            | AuthError::Store(_) => {
                error!(error = %err, context, "request failed");
                ApiError::Internal(context.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(_rejection: PathRejection) -> Self {
        ApiError::BadRequest("Invalid user id".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

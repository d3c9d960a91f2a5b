use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Body of register and both login routes.
///
/// Missing fields default to empty and are rejected by the service.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub userid: i32,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub userid: i32,
    pub token: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let userid = state
        .auth_service
        .register(&payload.name, &payload.password)
        .await
        .map_err(|e| ApiError::from_auth(e, "Registration failed"))?;

    let response = RegisterResponse {
        message: "User registered".to_string(),
        userid,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let auth = state
        .auth_service
        .login(&payload.name, &payload.password)
        .await
        .map_err(|e| ApiError::from_auth(e, "Login failed"))?;

    let response = LoginResponse {
        message: "Login successful".to_string(),
        userid: auth.user_id,
        token: auth.token,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// POST /admin/login
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let auth = state
        .auth_service
        .admin_login(&payload.name, &payload.password)
        .await
        .map_err(|e| ApiError::from_auth(e, "Admin login failed"))?;

    let response = LoginResponse {
        message: "Admin login successful".to_string(),
        userid: auth.user_id,
        token: auth.token,
    };
    Ok((StatusCode::OK, Json(response)))
}

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use storage::UserSummary;
use tracing::info;

use crate::middleware::AdminClaims;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    #[serde(rename = "newRating")]
    pub new_rating: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /admin/users - All users ordered by id
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state
        .admin_service
        .list_users()
        .await
        .map_err(|e| ApiError::from_auth(e, "Failed to fetch users"))?;

    Ok(Json(users))
}

/// PUT /admin/users/{id}/rating - Set a user's rating
pub async fn update_rating(
    State(state): State<Arc<AppState>>,
    AdminClaims(admin): AdminClaims,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<RatingResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let new_rating = parse_rating(payload.new_rating.as_ref())?;

    let user = state
        .admin_service
        .update_rating(id, new_rating)
        .await
        .map_err(|e| ApiError::from_auth(e, "Failed to update rating"))?;

    info!(admin_id = admin.id, user_id = id, rating = user.rating, "admin updated rating");
    Ok(Json(RatingResponse {
        message: "Rating updated".to_string(),
        user,
    }))
}

/// DELETE /admin/users/{id} - Remove a user and its dependent rows
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminClaims(admin): AdminClaims,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;

    let deleted = state
        .admin_service
        .delete_user(id)
        .await
        .map_err(|e| ApiError::from_auth(e, "Failed to delete user"))?;

    info!(admin_id = admin.id, user_id = deleted, "admin deleted user");
    Ok(Json(MessageResponse {
        message: format!("User {deleted} deleted"),
    }))
}

/// Accept the rating as a JSON number or a numeric string
fn parse_rating(value: Option<&JsonValue>) -> Result<f64, ApiError> {
    let invalid = || ApiError::BadRequest("Rating must be a non-negative number".to_string());

    match value {
        Some(JsonValue::Number(n)) => n.as_f64().ok_or_else(invalid),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

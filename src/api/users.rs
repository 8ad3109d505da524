//! System user endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{AuthResponse, UpdateProfileRequest, UserResponse};
use crate::services::{Authenticator, Session};
use crate::AppState;

use super::error::{ApiError, ApiJson};
use super::MessageResponse;

/// Owner accounts only
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = Authenticator::new(&state.db, &state.tokens)
        .list_system_users()
        .await?;
    Ok(Json(users))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    Authenticator::new(&state.db, &state.tokens)
        .remove_user(&session.user, &id)
        .await?;
    Ok(Json(MessageResponse::new("User removed")))
}

/// PUT /api/users/profile - update the caller's own profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = Authenticator::new(&state.db, &state.tokens)
        .update_profile(&session.user.id, req)
        .await?;
    Ok(Json(response))
}

//! Follow Graph Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::application::services::{FollowError, FollowService, FollowServiceImpl};
use crate::infrastructure::repositories::{
    PgFollowRepository, PgNotificationRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn follow_service(
    state: &AppState,
) -> FollowServiceImpl<PgFollowRepository, PgNotificationRepository, PgUserRepository> {
    FollowServiceImpl::new(
        Arc::new(PgFollowRepository::new(state.db.clone())),
        Arc::new(PgNotificationRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_follow_error(e: FollowError) -> AppError {
    match e {
        FollowError::UserNotFound => AppError::NotFound("User not found".into()),
        FollowError::SelfFollow => AppError::BadRequest("Cannot follow yourself".into()),
        FollowError::Internal(msg) => AppError::Internal(msg),
    }
}

fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))
}

/// Follow a user
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let followee_id = parse_user_id(&user_id)?;

    follow_service(&state)
        .follow(auth.user_id, followee_id)
        .await
        .map_err(map_follow_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Unfollow a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let followee_id = parse_user_id(&user_id)?;

    follow_service(&state)
        .unfollow(auth.user_id, followee_id)
        .await
        .map_err(map_follow_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Users the given user follows
pub async fn get_following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let user_id = parse_user_id(&user_id)?;

    let ids = follow_service(&state)
        .following(user_id)
        .await
        .map_err(map_follow_error)?;

    Ok(Json(ids))
}

/// Users following the given user
pub async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let user_id = parse_user_id(&user_id)?;

    let ids = follow_service(&state)
        .followers(user_id)
        .await
        .map_err(map_follow_error)?;

    Ok(Json(ids))
}

/// Derived mutual friends of the requester
pub async fn get_friends(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<String>>, AppError> {
    let ids = follow_service(&state)
        .friends(auth.user_id)
        .await
        .map_err(map_follow_error)?;

    Ok(Json(ids))
}

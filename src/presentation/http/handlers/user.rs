//! User Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::UpdateUserRequest;
use crate::application::dto::response::{
    ProfileResponse, RecommendedUserResponse, UserResponse,
};
use crate::application::services::{
    FollowService, FollowServiceImpl, UpdateUserDto, UserError, UserService, UserServiceImpl,
};
use crate::infrastructure::repositories::{
    PgFollowRepository, PgNotificationRepository, PgPostRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn user_service(
    state: &AppState,
) -> UserServiceImpl<PgUserRepository, PgFollowRepository, PgPostRepository> {
    UserServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgFollowRepository::new(state.db.clone())),
        Arc::new(PgPostRepository::new(state.db.clone())),
    )
}

fn map_user_error(e: UserError) -> AppError {
    match e {
        UserError::NotFound => AppError::NotFound("User not found".into()),
        UserError::UsernameExists => AppError::Conflict("Username already taken".into()),
        UserError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Get the authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let dto = user_service(&state)
        .get_me(auth.user_id)
        .await
        .map_err(map_user_error)?;

    Ok(Json(UserResponse::from_dto(dto, true)))
}

/// Update the authenticated user
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let update = UpdateUserDto {
        username: body.username,
        display_name: body.display_name,
        avatar_url: body.avatar_url,
        bio: body.bio,
    };

    let dto = user_service(&state)
        .update_me(auth.user_id, update)
        .await
        .map_err(map_user_error)?;

    Ok(Json(UserResponse::from_dto(dto, true)))
}

/// Public profile with counts
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id: i64 = user_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))?;

    let dto = user_service(&state)
        .get_profile(auth.user_id, user_id)
        .await
        .map_err(map_user_error)?;

    Ok(Json(ProfileResponse::from(dto)))
}

/// Recommended users for the requester, ranked by mutual connections
pub async fn get_recommended_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<RecommendedUserResponse>>, AppError> {
    let service = FollowServiceImpl::new(
        Arc::new(PgFollowRepository::new(state.db.clone())),
        Arc::new(PgNotificationRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    );

    let recommended = service
        .recommended(auth.user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(
        recommended
            .into_iter()
            .map(RecommendedUserResponse::from)
            .collect(),
    ))
}

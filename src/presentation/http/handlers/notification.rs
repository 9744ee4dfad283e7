//! Notification Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::response::NotificationResponse;
use crate::application::services::{FollowService, FollowServiceImpl};
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

/// List the requester's notifications, newest first
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let notifications = follow_service(&state)
        .notifications(auth.user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Mark all of the requester's notifications as read
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    follow_service(&state)
        .mark_notifications_read(auth.user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

//! Channel Handlers
//!
//! Channel CRUD plus the message history and REST send-fallback paths.
//! The fallback persists without broadcasting; clients that need real-time
//! updates use the gateway path.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    HistoryQueryParams, SendChannelMessageRequest, UpdateChannelRequest,
};
use crate::application::dto::response::{ChannelMessageResponse, ChannelResponse};
use crate::application::services::{
    ChatError, ChatService, ChatServiceImpl, CommunityService, UpdateChannelDto,
};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgChannelMessageRepository, PgChannelRepository, PgMembershipRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::community::{community_service, map_community_error};

fn chat_service(
    state: &AppState,
) -> ChatServiceImpl<
    PgChannelRepository,
    PgMembershipRepository,
    PgChannelMessageRepository,
    PgUserRepository,
> {
    ChatServiceImpl::new(
        Arc::new(PgChannelRepository::new(state.db.clone())),
        Arc::new(PgMembershipRepository::new(state.db.clone())),
        Arc::new(PgChannelMessageRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_chat_error(e: ChatError) -> AppError {
    match e {
        ChatError::ChannelNotFound => AppError::NotFound("Channel not found".into()),
        ChatError::Forbidden => AppError::Forbidden("Not a member of this community".into()),
        ChatError::VoiceChannel => {
            AppError::BadRequest("Voice channels do not accept messages".into())
        }
        ChatError::EmptyText => AppError::Validation("Message text must not be empty".into()),
        ChatError::TextTooLong => AppError::Validation("Message text too long".into()),
        ChatError::Internal(msg) => AppError::Internal(msg),
    }
}

fn parse_channel_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid channel ID".into()))
}

/// Get a channel
pub async fn get_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel_id = parse_channel_id(&channel_id)?;

    let dto = community_service(&state)
        .get_channel(channel_id, auth.user_id)
        .await
        .map_err(map_community_error)?;

    Ok(Json(ChannelResponse::from(dto)))
}

/// Update a channel (owner/admin only)
pub async fn update_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
    Json(body): Json<UpdateChannelRequest>,
) -> Result<Json<ChannelResponse>, AppError> {
    body.validate().map_err(validation_error)?;
    let channel_id = parse_channel_id(&channel_id)?;

    let update = UpdateChannelDto {
        name: body.name,
        topic: body.topic,
        position: body.position,
        parent_id: body
            .parent_id
            .map(|opt| opt.and_then(|s| s.parse().ok())),
    };

    let dto = community_service(&state)
        .update_channel(channel_id, auth.user_id, update)
        .await
        .map_err(map_community_error)?;

    Ok(Json(ChannelResponse::from(dto)))
}

/// Delete a channel (owner/admin only)
pub async fn delete_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let channel_id = parse_channel_id(&channel_id)?;

    community_service(&state)
        .delete_channel(channel_id, auth.user_id)
        .await
        .map_err(map_community_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Paginated message history in chronological order.
///
/// `limit` is clamped to [1, 50], default 50; `page` is 1-based.
pub async fn get_channel_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
    Query(query): Query<HistoryQueryParams>,
) -> Result<Json<Vec<ChannelMessageResponse>>, AppError> {
    let channel_id = parse_channel_id(&channel_id)?;

    let messages = chat_service(&state)
        .get_history(channel_id, auth.user_id, query.page, query.limit)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(
        messages
            .into_iter()
            .map(ChannelMessageResponse::from)
            .collect(),
    ))
}

/// REST send fallback: persists and returns the message without
/// broadcasting to live connections.
pub async fn send_channel_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
    Json(body): Json<SendChannelMessageRequest>,
) -> Result<(StatusCode, Json<ChannelMessageResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    let channel_id = parse_channel_id(&channel_id)?;

    let dto = chat_service(&state)
        .send_message(channel_id, auth.user_id, &body.content, body.attachments)
        .await
        .map_err(map_chat_error)?;
    metrics::record_message_persisted("channel", "rest");

    Ok((StatusCode::CREATED, Json(ChannelMessageResponse::from(dto))))
}

//! Conversation Handlers
//!
//! Direct-message history and the REST send fallback. History is the full
//! embedded message list with no pagination; the requester must be one of
//! the two participants encoded in the room key.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::SendDirectMessageRequest;
use crate::application::dto::response::ConversationMessageResponse;
use crate::application::services::{
    ConversationError, ConversationService, ConversationServiceImpl,
};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{PgConversationRepository, PgUserRepository};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn conversation_service(
    state: &AppState,
) -> ConversationServiceImpl<PgConversationRepository, PgUserRepository> {
    ConversationServiceImpl::new(
        Arc::new(PgConversationRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_conversation_error(e: ConversationError) -> AppError {
    match e {
        ConversationError::InvalidKey => AppError::BadRequest("Invalid room key".into()),
        ConversationError::Forbidden => {
            AppError::Forbidden("Not a participant of this conversation".into())
        }
        ConversationError::RecipientNotFound => AppError::NotFound("Recipient not found".into()),
        ConversationError::EmptyText => {
            AppError::Validation("Message text must not be empty".into())
        }
        ConversationError::TextTooLong => AppError::Validation("Message text too long".into()),
        ConversationError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Full history for a room in chronological order
pub async fn get_conversation_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_key): Path<String>,
) -> Result<Json<Vec<ConversationMessageResponse>>, AppError> {
    let messages = conversation_service(&state)
        .get_history(auth.user_id, &room_key)
        .await
        .map_err(map_conversation_error)?;

    Ok(Json(
        messages
            .into_iter()
            .map(ConversationMessageResponse::from)
            .collect(),
    ))
}

/// REST send fallback: persists without broadcasting.
pub async fn send_conversation_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_key): Path<String>,
    Json(body): Json<SendDirectMessageRequest>,
) -> Result<(StatusCode, Json<ConversationMessageResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let dto = conversation_service(&state)
        .send_by_key(auth.user_id, &room_key, &body.content)
        .await
        .map_err(map_conversation_error)?;
    metrics::record_message_persisted("dm", "rest");

    Ok((
        StatusCode::CREATED,
        Json(ConversationMessageResponse::from(dto)),
    ))
}

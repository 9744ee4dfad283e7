//! Community Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{CreateChannelRequest, CreateCommunityRequest};
use crate::application::dto::response::{ChannelResponse, CommunityResponse};
use crate::application::services::{
    CommunityError, CommunityService, CommunityServiceImpl, CreateChannelDto, CreateCommunityDto,
};
use crate::infrastructure::repositories::{
    PgChannelRepository, PgCommunityRepository, PgMembershipRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

pub(crate) fn community_service(
    state: &AppState,
) -> CommunityServiceImpl<PgCommunityRepository, PgMembershipRepository, PgChannelRepository> {
    CommunityServiceImpl::new(
        Arc::new(PgCommunityRepository::new(state.db.clone())),
        Arc::new(PgMembershipRepository::new(state.db.clone())),
        Arc::new(PgChannelRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

pub(crate) fn map_community_error(e: CommunityError) -> AppError {
    match e {
        CommunityError::NotFound => AppError::NotFound("Community not found".into()),
        CommunityError::ChannelNotFound => AppError::NotFound("Channel not found".into()),
        CommunityError::Forbidden => AppError::Forbidden("Permission denied".into()),
        CommunityError::AlreadyMember => AppError::Conflict("Already a member".into()),
        CommunityError::DuplicateChannelName => {
            AppError::Conflict("Channel name already in use".into())
        }
        CommunityError::EmptyChannelName => {
            AppError::Validation("Channel name must not be empty".into())
        }
        CommunityError::OwnerCannotLeave => {
            AppError::BadRequest("The owner cannot leave their community".into())
        }
        CommunityError::Internal(msg) => AppError::Internal(msg),
    }
}

fn parse_community_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid community ID".into()))
}

/// Create a community; the creator becomes its owner
pub async fn create_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<CommunityResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let dto = community_service(&state)
        .create_community(
            auth.user_id,
            CreateCommunityDto {
                name: body.name,
                description: body.description,
                icon_url: body.icon_url,
            },
        )
        .await
        .map_err(map_community_error)?;

    Ok((StatusCode::CREATED, Json(CommunityResponse::from(dto))))
}

/// Get a community
pub async fn get_community(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Result<Json<CommunityResponse>, AppError> {
    let community_id = parse_community_id(&community_id)?;

    let dto = community_service(&state)
        .get_community(community_id)
        .await
        .map_err(map_community_error)?;

    Ok(Json(CommunityResponse::from(dto)))
}

/// Communities the requester belongs to
pub async fn get_my_communities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<CommunityResponse>>, AppError> {
    let communities = community_service(&state)
        .my_communities(auth.user_id)
        .await
        .map_err(map_community_error)?;

    Ok(Json(
        communities.into_iter().map(CommunityResponse::from).collect(),
    ))
}

/// Join a community
pub async fn join_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(community_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let community_id = parse_community_id(&community_id)?;

    community_service(&state)
        .join(community_id, auth.user_id)
        .await
        .map_err(map_community_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Leave a community
pub async fn leave_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(community_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let community_id = parse_community_id(&community_id)?;

    community_service(&state)
        .leave(community_id, auth.user_id)
        .await
        .map_err(map_community_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// List channels of a community (members only)
pub async fn get_community_channels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(community_id): Path<String>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let community_id = parse_community_id(&community_id)?;

    let channels = community_service(&state)
        .get_channels(community_id, auth.user_id)
        .await
        .map_err(map_community_error)?;

    Ok(Json(channels.into_iter().map(ChannelResponse::from).collect()))
}

/// Create a channel (owner/admin only)
pub async fn create_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(community_id): Path<String>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    let community_id = parse_community_id(&community_id)?;

    let dto = community_service(&state)
        .create_channel(
            community_id,
            auth.user_id,
            CreateChannelDto {
                name: body.name,
                kind: body.kind,
                topic: body.topic,
                position: body.position,
                parent_id: body.parent_id.and_then(|s| s.parse().ok()),
            },
        )
        .await
        .map_err(map_community_error)?;

    Ok((StatusCode::CREATED, Json(ChannelResponse::from(dto))))
}

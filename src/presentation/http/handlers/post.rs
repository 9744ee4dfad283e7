//! Post Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{AddCommentRequest, CreatePostRequest, FeedQueryParams};
use crate::application::dto::response::{CommentResponse, PostResponse};
use crate::application::services::{
    CreatePostDto, PostError, PostService, PostServiceImpl,
};
use crate::infrastructure::repositories::{PgFollowRepository, PgPostRepository};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn post_service(state: &AppState) -> PostServiceImpl<PgPostRepository, PgFollowRepository> {
    PostServiceImpl::new(
        Arc::new(PgPostRepository::new(state.db.clone())),
        Arc::new(PgFollowRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_post_error(e: PostError) -> AppError {
    match e {
        PostError::NotFound => AppError::NotFound("Post not found".into()),
        PostError::Forbidden => AppError::Forbidden("Permission denied".into()),
        PostError::EmptyBody => AppError::Validation("Post body must not be empty".into()),
        PostError::BodyTooLong => AppError::Validation("Post body too long".into()),
        PostError::Internal(msg) => AppError::Internal(msg),
    }
}

fn parse_post_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid post ID".into()))
}

/// Create a post
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let dto = post_service(&state)
        .create_post(
            auth.user_id,
            CreatePostDto {
                body: body.body,
                image_url: body.image_url,
            },
        )
        .await
        .map_err(map_post_error)?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(dto))))
}

/// Feed of the requester and everyone they follow
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<FeedQueryParams>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let before = query.before.and_then(|s| s.parse().ok());

    let posts = post_service(&state)
        .get_feed(auth.user_id, before, query.limit)
        .await
        .map_err(map_post_error)?;

    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// Get a single post
pub async fn get_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let post_id = parse_post_id(&post_id)?;

    let dto = post_service(&state)
        .get_post(auth.user_id, post_id)
        .await
        .map_err(map_post_error)?;

    Ok(Json(PostResponse::from(dto)))
}

/// Delete a post (author only)
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let post_id = parse_post_id(&post_id)?;

    post_service(&state)
        .delete_post(post_id, auth.user_id)
        .await
        .map_err(map_post_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Like a post
pub async fn like_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let post_id = parse_post_id(&post_id)?;

    post_service(&state)
        .like_post(post_id, auth.user_id)
        .await
        .map_err(map_post_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove a like
pub async fn unlike_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let post_id = parse_post_id(&post_id)?;

    post_service(&state)
        .unlike_post(post_id, auth.user_id)
        .await
        .map_err(map_post_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a post
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<String>,
    Json(body): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    let post_id = parse_post_id(&post_id)?;

    let dto = post_service(&state)
        .add_comment(post_id, auth.user_id, &body.body)
        .await
        .map_err(map_post_error)?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(dto))))
}

/// List comments in chronological order
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let post_id = parse_post_id(&post_id)?;

    let comments = post_service(&state)
        .get_comments(post_id)
        .await
        .map_err(map_post_error)?;

    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

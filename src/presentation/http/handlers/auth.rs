//! Authentication Handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::application::dto::request::{
    LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest,
};
use crate::application::dto::response::{RegisterResponse, TokenResponse, UserResponse};
use crate::application::services::{AuthError, AuthService, AuthServiceImpl, UserDto};
use crate::infrastructure::repositories::{PgSessionRepository, PgUserRepository};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn auth_service(state: &AppState) -> AuthServiceImpl<PgUserRepository, PgSessionRepository> {
    AuthServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgSessionRepository::new(state.db.clone())),
        state.snowflake.clone(),
        state.settings.jwt.clone(),
    )
}

fn map_auth_error(e: AuthError) -> AppError {
    match e {
        AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
        AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
        AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
        AuthError::SessionNotFound => AppError::Unauthorized("Session not found or expired".into()),
        AuthError::UserNotFound => AppError::NotFound("User not found".into()),
        AuthError::EmailExists => AppError::Conflict("Email already registered".into()),
        AuthError::UsernameExists => AppError::Conflict("Username already taken".into()),
        AuthError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let service = auth_service(&state);
    let (user, tokens) = service
        .register(&body.username, &body.email, &body.password)
        .await
        .map_err(map_auth_error)?;

    let user_dto = UserDto {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        bio: user.bio,
        created_at: user.created_at.to_rfc3339(),
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from_dto(user_dto, true),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }),
    ))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let service = auth_service(&state);
    let tokens = service
        .authenticate(&body.email, &body.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(TokenResponse::from(tokens)))
}

/// Exchange a refresh token for fresh tokens
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let service = auth_service(&state);
    let tokens = service
        .refresh_token(&body.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(TokenResponse::from(tokens)))
}

/// Revoke a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> Result<StatusCode, AppError> {
    let service = auth_service(&state);
    service
        .revoke_token(&body.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}

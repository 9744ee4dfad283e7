//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, create_security_headers_layer, logging};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Security headers on every response
        .layer(create_security_headers_layer())
        .layer(middleware::from_fn(logging::track_requests))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes
        .nest("/auth", auth_routes())
        // Protected routes (require authentication)
        .nest("/users", user_routes(state.clone()))
        .nest("/posts", post_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/communities", community_routes(state.clone()))
        .nest("/channels", channel_routes(state.clone()))
        .nest("/conversations", conversation_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/logout", post(handlers::auth::logout))
}

/// User routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/@me", get(handlers::user::get_current_user))
        .route("/@me", patch(handlers::user::update_current_user))
        .route("/@me/friends", get(handlers::follow::get_friends))
        .route("/recommended", get(handlers::user::get_recommended_users))
        .route("/{user_id}/profile", get(handlers::user::get_profile))
        .route("/{user_id}/follow", post(handlers::follow::follow_user))
        .route("/{user_id}/follow", delete(handlers::follow::unfollow_user))
        .route("/{user_id}/followers", get(handlers::follow::get_followers))
        .route("/{user_id}/following", get(handlers::follow::get_following))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Post routes (protected)
fn post_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::post::create_post))
        .route("/feed", get(handlers::post::get_feed))
        .route("/{post_id}", get(handlers::post::get_post))
        .route("/{post_id}", delete(handlers::post::delete_post))
        .route("/{post_id}/like", post(handlers::post::like_post))
        .route("/{post_id}/like", delete(handlers::post::unlike_post))
        .route("/{post_id}/comments", post(handlers::post::add_comment))
        .route("/{post_id}/comments", get(handlers::post::get_comments))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::notification::get_notifications))
        .route("/read", post(handlers::notification::mark_notifications_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Community routes (protected)
fn community_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::community::create_community))
        .route("/@me", get(handlers::community::get_my_communities))
        .route("/{community_id}", get(handlers::community::get_community))
        .route("/{community_id}/join", post(handlers::community::join_community))
        .route("/{community_id}/leave", post(handlers::community::leave_community))
        .route(
            "/{community_id}/channels",
            get(handlers::community::get_community_channels),
        )
        .route(
            "/{community_id}/channels",
            post(handlers::community::create_channel),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Channel routes (protected)
fn channel_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{channel_id}", get(handlers::channel::get_channel))
        .route("/{channel_id}", patch(handlers::channel::update_channel))
        .route("/{channel_id}", delete(handlers::channel::delete_channel))
        .route(
            "/{channel_id}/messages",
            get(handlers::channel::get_channel_messages),
        )
        .route(
            "/{channel_id}/messages",
            post(handlers::channel::send_channel_message),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Conversation routes (protected)
fn conversation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/{room_key}/messages",
            get(handlers::conversation::get_conversation_messages),
        )
        .route(
            "/{room_key}/messages",
            post(handlers::conversation::send_conversation_message),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

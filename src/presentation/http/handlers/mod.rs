//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod auth;
pub mod channel;
pub mod community;
pub mod conversation;
pub mod follow;
pub mod health;
pub mod notification;
pub mod post;
pub mod user;

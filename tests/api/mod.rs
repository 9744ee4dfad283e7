//! REST API endpoint tests

mod auth_tests;
mod channel_tests;
mod conversation_tests;
mod health_tests;

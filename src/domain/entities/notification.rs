//! Notification entity and repository trait.
//!
//! Maps to the `notifications` table. Notifications are fan-in records
//! created when another user acts on you (currently: follows).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Notification kinds matching the `notification_kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone started following the recipient
    #[default]
    Follow,
}

impl NotificationKind {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "follow" => Self::Follow,
            _ => Self::Follow,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification delivered to one recipient.
///
/// Maps to the `notifications` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - recipient_id: BIGINT NOT NULL REFERENCES users(id)
/// - actor_id: BIGINT NOT NULL REFERENCES users(id)
/// - kind: VARCHAR(20) NOT NULL
/// - read: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub actor_id: i64,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for Notification data access operations.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Create a notification.
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;

    /// List a recipient's notifications, newest first.
    async fn find_by_recipient(
        &self,
        recipient_id: i64,
        limit: i32,
    ) -> Result<Vec<Notification>, AppError>;

    /// Mark all of a recipient's notifications as read.
    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError>;
}

//! Channel message entity and repository trait.
//!
//! Maps to the `channel_messages` table. Messages are immutable once
//! created; there is no edit or delete operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A message posted in a text channel.
///
/// Maps to the `channel_messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - channel_id: BIGINT NOT NULL REFERENCES channels(id)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - content: TEXT NOT NULL (max 4000 characters, non-empty after trim)
/// - attachments: JSONB NOT NULL DEFAULT '[]' (list of attachment urls)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Channel the message was posted in
    pub channel_id: i64,

    /// Sender user ID
    pub sender_id: i64,

    /// Message text
    pub content: String,

    /// Attachment URL references
    #[serde(default)]
    pub attachments: Vec<String>,

    /// Timestamp when the message was sent
    pub created_at: DateTime<Utc>,
}

/// Repository trait for ChannelMessage data access operations.
#[async_trait]
pub trait ChannelMessageRepository: Send + Sync {
    /// Persist a new message.
    async fn create(&self, message: &ChannelMessage) -> Result<ChannelMessage, AppError>;

    /// Page of messages, newest first. `page` is 1-based; callers re-reverse
    /// the result to present chronological order.
    async fn find_page(
        &self,
        channel_id: i64,
        page: i32,
        limit: i32,
    ) -> Result<Vec<ChannelMessage>, AppError>;

    /// Count messages in a channel.
    async fn count_by_channel(&self, channel_id: i64) -> Result<i64, AppError>;
}

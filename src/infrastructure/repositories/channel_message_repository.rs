//! Channel Message Repository Implementation
//!
//! PostgreSQL implementation of channel message storage with page-based
//! history retrieval.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::{ChannelMessage, ChannelMessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL channel message repository implementation.
///
/// Messages are append-only; the table has no UPDATE or single-row DELETE
/// path.
pub struct PgChannelMessageRepository {
    pool: PgPool,
}

impl PgChannelMessageRepository {
    /// Creates a new PgChannelMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for channel message queries.
#[derive(Debug, sqlx::FromRow)]
struct ChannelMessageRow {
    id: i64,
    channel_id: i64,
    sender_id: i64,
    content: String,
    attachments: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl ChannelMessageRow {
    fn into_message(self) -> ChannelMessage {
        ChannelMessage {
            id: self.id,
            channel_id: self.channel_id,
            sender_id: self.sender_id,
            content: self.content,
            attachments: self.attachments.0,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl ChannelMessageRepository for PgChannelMessageRepository {
    /// Persist a new message.
    ///
    /// The message ID should be a pre-generated Snowflake ID from the
    /// application layer.
    async fn create(&self, message: &ChannelMessage) -> Result<ChannelMessage, AppError> {
        let row = sqlx::query_as::<_, ChannelMessageRow>(
            r#"
            INSERT INTO channel_messages (id, channel_id, sender_id, content, attachments)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, channel_id, sender_id, content, attachments, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(Json(&message.attachments))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Fetch one page of messages, newest first.
    ///
    /// `page` is 1-based; rows come back in reverse-chronological order and
    /// the service layer re-reverses them before returning history.
    async fn find_page(
        &self,
        channel_id: i64,
        page: i32,
        limit: i32,
    ) -> Result<Vec<ChannelMessage>, AppError> {
        let limit = limit.clamp(1, 50);
        let page = page.max(1);
        let offset = (page as i64 - 1) * limit as i64;

        let rows = sqlx::query_as::<_, ChannelMessageRow>(
            r#"
            SELECT id, channel_id, sender_id, content, attachments, created_at
            FROM channel_messages
            WHERE channel_id = $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(channel_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }

    async fn count_by_channel(&self, channel_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM channel_messages WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

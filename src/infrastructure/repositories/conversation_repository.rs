//! Conversation Repository Implementation
//!
//! PostgreSQL implementation of direct-message rooms. The room row is
//! upserted together with each message append so the room springs into
//! existence on first use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Conversation, ConversationMessage, ConversationRepository};
use crate::shared::error::AppError;

/// PostgreSQL conversation repository implementation.
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Creates a new PgConversationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    room_key: String,
    user_a: i64,
    user_b: i64,
    created_at: DateTime<Utc>,
}

impl ConversationRow {
    fn into_conversation(self) -> Conversation {
        Conversation {
            room_key: self.room_key,
            user_a: self.user_a,
            user_b: self.user_b,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationMessageRow {
    id: i64,
    room_key: String,
    sender_id: i64,
    content: String,
    delivered: bool,
    seen: bool,
    created_at: DateTime<Utc>,
}

impl ConversationMessageRow {
    fn into_message(self) -> ConversationMessage {
        ConversationMessage {
            id: self.id,
            room_key: self.room_key,
            sender_id: self.sender_id,
            content: self.content,
            delivered: self.delivered,
            seen: self.seen,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_by_key(&self, room_key: &str) -> Result<Option<Conversation>, AppError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT room_key, user_a, user_b, created_at
            FROM conversations
            WHERE room_key = $1
            "#,
        )
        .bind(room_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_conversation()))
    }

    /// Upsert the room and append the message in one transaction.
    ///
    /// The room insert is a no-op when the room already exists; the message
    /// insert is the single atomic step the rest of the system relies on.
    async fn append_message(
        &self,
        conversation: &Conversation,
        message: &ConversationMessage,
    ) -> Result<ConversationMessage, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (room_key, user_a, user_b)
            VALUES ($1, $2, $3)
            ON CONFLICT (room_key) DO NOTHING
            "#,
        )
        .bind(&conversation.room_key)
        .bind(conversation.user_a)
        .bind(conversation.user_b)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ConversationMessageRow>(
            r#"
            INSERT INTO conversation_messages (id, room_key, sender_id, content, delivered, seen)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, room_key, sender_id, content, delivered, seen, created_at
            "#,
        )
        .bind(message.id)
        .bind(&message.room_key)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.delivered)
        .bind(message.seen)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into_message())
    }

    async fn find_messages(&self, room_key: &str) -> Result<Vec<ConversationMessage>, AppError> {
        let rows = sqlx::query_as::<_, ConversationMessageRow>(
            r#"
            SELECT id, room_key, sender_id, content, delivered, seen, created_at
            FROM conversation_messages
            WHERE room_key = $1
            ORDER BY id ASC
            "#,
        )
        .bind(room_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }
}

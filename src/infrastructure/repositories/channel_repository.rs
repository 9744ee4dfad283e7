//! Channel Repository Implementation
//!
//! PostgreSQL implementation of channel operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Channel, ChannelKind, ChannelRepository};
use crate::shared::error::AppError;

/// PostgreSQL channel repository implementation.
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    /// Creates a new PgChannelRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for channel queries.
/// Maps to the channels table schema defined in the migration.
#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    community_id: i64,
    name: String,
    kind: String,
    topic: Option<String>,
    position: i32,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChannelRow {
    fn into_channel(self) -> Channel {
        Channel {
            id: self.id,
            community_id: self.community_id,
            name: self.name,
            kind: ChannelKind::from_str(&self.kind),
            topic: self.topic,
            position: self.position,
            parent_id: self.parent_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, community_id, name, kind, topic, position, parent_id,
                   created_at, updated_at
            FROM channels
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_channel()))
    }

    async fn find_by_community(&self, community_id: i64) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, community_id, name, kind, topic, position, parent_id,
                   created_at, updated_at
            FROM channels
            WHERE community_id = $1
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_channel()).collect())
    }

    async fn name_exists(&self, community_id: i64, name: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM channels WHERE community_id = $1 AND name = $2)",
        )
        .bind(community_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Create a new channel.
    ///
    /// The channel ID should be a pre-generated Snowflake ID from the
    /// application layer; the name is expected in slug form.
    async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            INSERT INTO channels (id, community_id, name, kind, topic, position, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, community_id, name, kind, topic, position, parent_id,
                      created_at, updated_at
            "#,
        )
        .bind(channel.id)
        .bind(channel.community_id)
        .bind(&channel.name)
        .bind(channel.kind.as_str())
        .bind(&channel.topic)
        .bind(channel.position)
        .bind(channel.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Channel name already in use".into())
            }
            _ => AppError::from(e),
        })?;

        Ok(row.into_channel())
    }

    async fn update(&self, channel: &Channel) -> Result<Channel, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            UPDATE channels
            SET name = $2, topic = $3, position = $4, parent_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, community_id, name, kind, topic, position, parent_id,
                      created_at, updated_at
            "#,
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(&channel.topic)
        .bind(channel.position)
        .bind(channel.parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_channel())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Channel {} not found", id)));
        }

        Ok(())
    }
}

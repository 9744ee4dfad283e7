//! Notification Repository Implementation
//!
//! PostgreSQL implementation of notification fan-in records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Notification, NotificationKind, NotificationRepository};
use crate::shared::error::AppError;

/// PostgreSQL notification repository implementation.
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Creates a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    actor_id: i64,
    kind: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Notification {
        Notification {
            id: self.id,
            recipient_id: self.recipient_id,
            actor_id: self.actor_id,
            kind: NotificationKind::from_str(&self.kind),
            read: self.read,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, recipient_id, actor_id, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING id, recipient_id, actor_id, kind, read, created_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.actor_id)
        .bind(notification.kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_notification())
    }

    async fn find_by_recipient(
        &self,
        recipient_id: i64,
        limit: i32,
    ) -> Result<Vec<Notification>, AppError> {
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, actor_id, kind, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_notification()).collect())
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE recipient_id = $1 AND read = FALSE")
                .bind(recipient_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

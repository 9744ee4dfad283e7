//! Community Repository Implementation
//!
//! PostgreSQL implementation of community operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Community, CommunityRepository};
use crate::shared::error::AppError;

/// PostgreSQL community repository implementation.
pub struct PgCommunityRepository {
    pool: PgPool,
}

impl PgCommunityRepository {
    /// Creates a new PgCommunityRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommunityRow {
    id: i64,
    name: String,
    owner_id: i64,
    description: Option<String>,
    icon_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommunityRow {
    fn into_community(self) -> Community {
        Community {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
            description: self.description,
            icon_url: self.icon_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl CommunityRepository for PgCommunityRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Community>, AppError> {
        let row = sqlx::query_as::<_, CommunityRow>(
            r#"
            SELECT id, name, owner_id, description, icon_url, created_at, updated_at
            FROM communities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_community()))
    }

    async fn create(&self, community: &Community) -> Result<Community, AppError> {
        let row = sqlx::query_as::<_, CommunityRow>(
            r#"
            INSERT INTO communities (id, name, owner_id, description, icon_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, owner_id, description, icon_url, created_at, updated_at
            "#,
        )
        .bind(community.id)
        .bind(&community.name)
        .bind(community.owner_id)
        .bind(&community.description)
        .bind(&community.icon_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_community())
    }

    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Community>, AppError> {
        let rows = sqlx::query_as::<_, CommunityRow>(
            r#"
            SELECT c.id, c.name, c.owner_id, c.description, c.icon_url, c.created_at, c.updated_at
            FROM communities c
            JOIN community_members m ON m.community_id = c.id
            WHERE m.user_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_community()).collect())
    }
}

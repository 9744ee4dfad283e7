//! Membership Repository Implementation
//!
//! PostgreSQL implementation of community membership operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{MemberRole, Membership, MembershipRepository};
use crate::shared::error::AppError;

/// PostgreSQL membership repository implementation.
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Creates a new PgMembershipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    community_id: i64,
    user_id: i64,
    role: String,
    joined_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> Membership {
        Membership {
            community_id: self.community_id,
            user_id: self.user_id,
            role: MemberRole::from_str(&self.role),
            joined_at: self.joined_at,
        }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn find(&self, community_id: i64, user_id: i64) -> Result<Option<Membership>, AppError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT community_id, user_id, role, joined_at
            FROM community_members
            WHERE community_id = $1 AND user_id = $2
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_membership()))
    }

    async fn create(&self, membership: &Membership) -> Result<Membership, AppError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO community_members (community_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING community_id, user_id, role, joined_at
            "#,
        )
        .bind(membership.community_id)
        .bind(membership.user_id)
        .bind(membership.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Already a member of this community".into())
            }
            _ => AppError::from(e),
        })?;

        Ok(row.into_membership())
    }

    async fn delete(&self, community_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM community_members WHERE community_id = $1 AND user_id = $2")
            .bind(community_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn is_member(&self, community_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM community_members WHERE community_id = $1 AND user_id = $2)",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_by_community(&self, community_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM community_members WHERE community_id = $1",
        )
        .bind(community_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

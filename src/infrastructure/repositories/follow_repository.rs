//! Follow Repository Implementation
//!
//! PostgreSQL implementation of the follow graph. Friendship and
//! recommendations are derived with joins; nothing beyond the directed
//! edges is stored.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{FollowRepository, RecommendedUser};
use crate::shared::error::AppError;

/// PostgreSQL follow repository implementation.
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    /// Creates a new PgFollowRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecommendedRow {
    user_id: i64,
    mutual_count: i64,
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    /// Create a follow edge.
    ///
    /// Returns false when the edge already existed, which callers use to
    /// skip duplicate notifications.
    async fn create(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, follower_id: i64, followee_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn exists(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn following_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT followee_id FROM follows WHERE follower_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn follower_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT follower_id FROM follows WHERE followee_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn following_count(&self, user_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn follower_count(&self, user_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Derived friend set: both directed edges must exist.
    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT f.followee_id
            FROM follows f
            JOIN follows r
              ON r.follower_id = f.followee_id AND r.followee_id = f.follower_id
            WHERE f.follower_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Recommendation query: second-degree connections the user does not
    /// already follow, ranked by how many of the user's followees also
    /// follow them.
    async fn recommended(
        &self,
        user_id: i64,
        limit: i32,
    ) -> Result<Vec<RecommendedUser>, AppError> {
        let limit = limit.clamp(1, 50);

        let rows = sqlx::query_as::<_, RecommendedRow>(
            r#"
            SELECT f2.followee_id AS user_id, COUNT(*) AS mutual_count
            FROM follows f1
            JOIN follows f2 ON f2.follower_id = f1.followee_id
            WHERE f1.follower_id = $1
              AND f2.followee_id <> $1
              AND f2.followee_id NOT IN (
                  SELECT followee_id FROM follows WHERE follower_id = $1
              )
            GROUP BY f2.followee_id
            ORDER BY mutual_count DESC, f2.followee_id ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RecommendedUser {
                user_id: r.user_id,
                mutual_count: r.mutual_count,
            })
            .collect())
    }
}

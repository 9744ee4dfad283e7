//! Post Repository Implementation
//!
//! PostgreSQL implementation of post, like, and comment operations with
//! keyset pagination for the feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Comment, Post, PostRepository};
use crate::shared::error::AppError;

/// PostgreSQL post repository implementation.
///
/// Likes are modeled as a unique (post, user) pair; both like and unlike
/// are idempotent at the SQL level.
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Creates a new PgPostRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    body: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            body: self.body,
            image_url: self.image_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    body: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            author_id: self.author_id,
            body: self.body,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, author_id, body, image_url, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_post()))
    }

    async fn create(&self, post: &Post) -> Result<Post, AppError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, author_id, body, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, body, image_url, created_at, updated_at
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.body)
        .bind(&post.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_post())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }

        Ok(())
    }

    /// Feed query with keyset pagination.
    ///
    /// Returns posts from the given authors newest first; `before` is an
    /// exclusive snowflake-id cursor.
    async fn find_feed(
        &self,
        author_ids: &[i64],
        before: Option<i64>,
        limit: i32,
    ) -> Result<Vec<Post>, AppError> {
        let limit = limit.clamp(1, 100);

        let rows = match before {
            Some(before_id) => {
                sqlx::query_as::<_, PostRow>(
                    r#"
                    SELECT id, author_id, body, image_url, created_at, updated_at
                    FROM posts
                    WHERE author_id = ANY($1) AND id < $2
                    ORDER BY id DESC
                    LIMIT $3
                    "#,
                )
                .bind(author_ids)
                .bind(before_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PostRow>(
                    r#"
                    SELECT id, author_id, body, image_url, created_at, updated_at
                    FROM posts
                    WHERE author_id = ANY($1)
                    ORDER BY id DESC
                    LIMIT $2
                    "#,
                )
                .bind(author_ids)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|r| r.into_post()).collect())
    }

    async fn count_by_author(&self, author_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn like(&self, post_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unlike(&self, post_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_likes(&self, post_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn has_liked(&self, post_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn add_comment(&self, comment: &Comment) -> Result<Comment, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO post_comments (id, post_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, author_id, body, created_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_comment())
    }

    async fn find_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_id, body, created_at
            FROM post_comments
            WHERE post_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_comment()).collect())
    }
}

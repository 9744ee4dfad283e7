//! Post, like, and comment entities with their repository trait.
//!
//! Maps to the `posts`, `post_likes`, and `post_comments` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A post on a user's timeline.
///
/// Maps to the `posts` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - body: TEXT NOT NULL (max 4000 characters)
/// - image_url: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A like on a post. Unique per (post, user).
///
/// Maps to the `post_likes` table (composite primary key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLike {
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A comment on a post. Append-only; no edit operation exists.
///
/// Maps to the `post_comments` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - post_id: BIGINT NOT NULL REFERENCES posts(id)
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - body: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for Post data access operations.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find a post by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError>;

    /// Create a new post.
    async fn create(&self, post: &Post) -> Result<Post, AppError>;

    /// Delete a post (author only, enforced by the service layer).
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Feed query: recent posts authored by any of the given users,
    /// newest first, keyset-paginated by snowflake id.
    async fn find_feed(
        &self,
        author_ids: &[i64],
        before: Option<i64>,
        limit: i32,
    ) -> Result<Vec<Post>, AppError>;

    /// Count posts by an author.
    async fn count_by_author(&self, author_id: i64) -> Result<i64, AppError>;

    /// Like a post. Idempotent: liking twice leaves one like.
    async fn like(&self, post_id: i64, user_id: i64) -> Result<(), AppError>;

    /// Remove a like. Idempotent: unliking a post that was never liked is a no-op.
    async fn unlike(&self, post_id: i64, user_id: i64) -> Result<(), AppError>;

    /// Count likes on a post.
    async fn count_likes(&self, post_id: i64) -> Result<i64, AppError>;

    /// Check whether a user has liked a post.
    async fn has_liked(&self, post_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Append a comment to a post.
    async fn add_comment(&self, comment: &Comment) -> Result<Comment, AppError>;

    /// List comments on a post in chronological order.
    async fn find_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError>;
}

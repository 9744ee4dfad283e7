//! Follow edge entity and repository trait.
//!
//! Maps to the `follows` table. Friendship is derived, never stored: two
//! users are friends iff both directed edges exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A directed follow edge.
///
/// Maps to the `follows` table (composite primary key):
/// - follower_id: BIGINT NOT NULL REFERENCES users(id)
/// - followee_id: BIGINT NOT NULL REFERENCES users(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: i64,
    pub followee_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A recommendation candidate with its mutual-connection count.
#[derive(Debug, Clone)]
pub struct RecommendedUser {
    pub user_id: i64,
    pub mutual_count: i64,
}

/// Repository trait for follow-graph data access operations.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Create a follow edge. Returns false if the edge already existed.
    async fn create(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError>;

    /// Remove a follow edge; idempotent.
    async fn delete(&self, follower_id: i64, followee_id: i64) -> Result<(), AppError>;

    /// Check whether follower follows followee.
    async fn exists(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError>;

    /// Ids of users that `user_id` follows.
    async fn following_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Ids of users following `user_id`.
    async fn follower_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Number of users that `user_id` follows.
    async fn following_count(&self, user_id: i64) -> Result<i64, AppError>;

    /// Number of users following `user_id`.
    async fn follower_count(&self, user_id: i64) -> Result<i64, AppError>;

    /// Derived friend set: users with edges in both directions.
    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Users the requester does not follow, ranked by mutual connections.
    async fn recommended(&self, user_id: i64, limit: i32) -> Result<Vec<RecommendedUser>, AppError>;
}

//! Follow Service
//!
//! Follow/unfollow, follower listings, derived friends, notifications,
//! and the canonical recommended-users operation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    FollowRepository, Notification, NotificationKind, NotificationRepository, UserRepository,
};
use crate::shared::snowflake::SnowflakeGenerator;

/// Follow service trait
#[async_trait]
pub trait FollowService: Send + Sync {
    /// Follow a user. Creates a notification for the followee on the first
    /// follow only.
    async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<(), FollowError>;

    /// Unfollow a user; idempotent
    async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<(), FollowError>;

    /// Ids of users the given user follows
    async fn following(&self, user_id: i64) -> Result<Vec<String>, FollowError>;

    /// Ids of users following the given user
    async fn followers(&self, user_id: i64) -> Result<Vec<String>, FollowError>;

    /// Derived mutual-friend ids
    async fn friends(&self, user_id: i64) -> Result<Vec<String>, FollowError>;

    /// Recommended users ranked by mutual connections, capped at 10
    async fn recommended(&self, user_id: i64) -> Result<Vec<RecommendedUserDto>, FollowError>;

    /// The requester's notifications, newest first
    async fn notifications(&self, user_id: i64) -> Result<Vec<NotificationDto>, FollowError>;

    /// Mark all of the requester's notifications read
    async fn mark_notifications_read(&self, user_id: i64) -> Result<u64, FollowError>;
}

/// Recommended user data transfer object
#[derive(Debug, Clone)]
pub struct RecommendedUserDto {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub mutual_count: i64,
}

/// Notification data transfer object
#[derive(Debug, Clone)]
pub struct NotificationDto {
    pub id: String,
    pub actor_id: String,
    pub kind: String,
    pub read: bool,
    pub created_at: String,
}

/// Follow service errors
#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("User not found")]
    UserNotFound,

    #[error("Cannot follow yourself")]
    SelfFollow,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// FollowService implementation
pub struct FollowServiceImpl<F, N, U>
where
    F: FollowRepository,
    N: NotificationRepository,
    U: UserRepository,
{
    follow_repo: Arc<F>,
    notification_repo: Arc<N>,
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<F, N, U> FollowServiceImpl<F, N, U>
where
    F: FollowRepository,
    N: NotificationRepository,
    U: UserRepository,
{
    pub fn new(
        follow_repo: Arc<F>,
        notification_repo: Arc<N>,
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            follow_repo,
            notification_repo,
            user_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<F, N, U> FollowService for FollowServiceImpl<F, N, U>
where
    F: FollowRepository + 'static,
    N: NotificationRepository + 'static,
    U: UserRepository + 'static,
{
    async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<(), FollowError> {
        if follower_id == followee_id {
            return Err(FollowError::SelfFollow);
        }

        self.user_repo
            .find_by_id(followee_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?
            .ok_or(FollowError::UserNotFound)?;

        let inserted = self
            .follow_repo
            .create(follower_id, followee_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?;

        // Re-follows do not re-notify
        if inserted {
            let notification = Notification {
                id: self.id_generator.generate(),
                recipient_id: followee_id,
                actor_id: follower_id,
                kind: NotificationKind::Follow,
                read: false,
                created_at: Utc::now(),
            };
            self.notification_repo
                .create(&notification)
                .await
                .map_err(|e| FollowError::Internal(e.to_string()))?;
        }

        Ok(())
    }

    async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<(), FollowError> {
        self.follow_repo
            .delete(follower_id, followee_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))
    }

    async fn following(&self, user_id: i64) -> Result<Vec<String>, FollowError> {
        let ids = self
            .follow_repo
            .following_ids(user_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?;
        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    async fn followers(&self, user_id: i64) -> Result<Vec<String>, FollowError> {
        let ids = self
            .follow_repo
            .follower_ids(user_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?;
        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    async fn friends(&self, user_id: i64) -> Result<Vec<String>, FollowError> {
        let ids = self
            .follow_repo
            .friend_ids(user_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?;
        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    async fn recommended(&self, user_id: i64) -> Result<Vec<RecommendedUserDto>, FollowError> {
        let candidates = self
            .follow_repo
            .recommended(user_id, 10)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?;

        let mut dtos = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let user = self
                .user_repo
                .find_by_id(candidate.user_id)
                .await
                .map_err(|e| FollowError::Internal(e.to_string()))?;
            if let Some(user) = user {
                dtos.push(RecommendedUserDto {
                    id: user.id.to_string(),
                    username: user.username,
                    display_name: user.display_name,
                    avatar_url: user.avatar_url,
                    mutual_count: candidate.mutual_count,
                });
            }
        }
        Ok(dtos)
    }

    async fn notifications(&self, user_id: i64) -> Result<Vec<NotificationDto>, FollowError> {
        let notifications = self
            .notification_repo
            .find_by_recipient(user_id, 50)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))?;

        Ok(notifications
            .into_iter()
            .map(|n| NotificationDto {
                id: n.id.to_string(),
                actor_id: n.actor_id.to_string(),
                kind: n.kind.as_str().to_string(),
                read: n.read,
                created_at: n.created_at.to_rfc3339(),
            })
            .collect())
    }

    async fn mark_notifications_read(&self, user_id: i64) -> Result<u64, FollowError> {
        self.notification_repo
            .mark_all_read(user_id)
            .await
            .map_err(|e| FollowError::Internal(e.to_string()))
    }
}

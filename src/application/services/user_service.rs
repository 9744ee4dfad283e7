//! User Service
//!
//! Profile retrieval and account updates. There is exactly one profile
//! shape; every caller sees the same field set.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{FollowRepository, PostRepository, UserRepository};

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get the authenticated user's own record
    async fn get_me(&self, user_id: i64) -> Result<UserDto, UserError>;

    /// Update the authenticated user's record
    async fn update_me(&self, user_id: i64, update: UpdateUserDto) -> Result<UserDto, UserError>;

    /// Public profile for any user, as seen by the requester
    async fn get_profile(&self, requester_id: i64, user_id: i64) -> Result<ProfileDto, UserError>;
}

/// User data transfer object
#[derive(Debug, Clone)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

/// Profile data transfer object (public view with counts)
#[derive(Debug, Clone)]
pub struct ProfileDto {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub followed_by_me: bool,
}

/// Update user request
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// UserService implementation
pub struct UserServiceImpl<U, F, P>
where
    U: UserRepository,
    F: FollowRepository,
    P: PostRepository,
{
    user_repo: Arc<U>,
    follow_repo: Arc<F>,
    post_repo: Arc<P>,
}

impl<U, F, P> UserServiceImpl<U, F, P>
where
    U: UserRepository,
    F: FollowRepository,
    P: PostRepository,
{
    pub fn new(user_repo: Arc<U>, follow_repo: Arc<F>, post_repo: Arc<P>) -> Self {
        Self {
            user_repo,
            follow_repo,
            post_repo,
        }
    }
}

fn to_user_dto(user: crate::domain::User) -> UserDto {
    UserDto {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        bio: user.bio,
        created_at: user.created_at.to_rfc3339(),
    }
}

#[async_trait]
impl<U, F, P> UserService for UserServiceImpl<U, F, P>
where
    U: UserRepository + 'static,
    F: FollowRepository + 'static,
    P: PostRepository + 'static,
{
    async fn get_me(&self, user_id: i64) -> Result<UserDto, UserError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)?;

        Ok(to_user_dto(user))
    }

    async fn update_me(&self, user_id: i64, update: UpdateUserDto) -> Result<UserDto, UserError> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)?;

        if let Some(username) = update.username {
            if username != user.username {
                let taken = self
                    .user_repo
                    .username_exists(&username)
                    .await
                    .map_err(|e| UserError::Internal(e.to_string()))?;
                if taken {
                    return Err(UserError::UsernameExists);
                }
                user.username = username;
            }
        }
        if let Some(display_name) = update.display_name {
            user.display_name = Some(display_name);
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }

        let updated = self
            .user_repo
            .update(&user)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(to_user_dto(updated))
    }

    async fn get_profile(&self, requester_id: i64, user_id: i64) -> Result<ProfileDto, UserError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)?;

        let post_count = self
            .post_repo
            .count_by_author(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let follower_count = self
            .follow_repo
            .follower_count(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let following_count = self
            .follow_repo
            .following_count(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let followed_by_me = if requester_id == user_id {
            false
        } else {
            self.follow_repo
                .exists(requester_id, user_id)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?
        };

        Ok(ProfileDto {
            id: user.id.to_string(),
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            bio: user.bio,
            post_count,
            follower_count,
            following_count,
            followed_by_me,
        })
    }
}

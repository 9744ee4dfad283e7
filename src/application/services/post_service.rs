//! Post Service
//!
//! Handles posts, likes, comments, and the follow-scoped feed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Comment, FollowRepository, Post, PostRepository};
use crate::shared::snowflake::SnowflakeGenerator;

/// Post service trait
#[async_trait]
pub trait PostService: Send + Sync {
    /// Create a new post
    async fn create_post(&self, author_id: i64, request: CreatePostDto) -> Result<PostDto, PostError>;

    /// Get a single post as seen by the requester
    async fn get_post(&self, requester_id: i64, post_id: i64) -> Result<PostDto, PostError>;

    /// Delete a post (author only)
    async fn delete_post(&self, post_id: i64, actor_id: i64) -> Result<(), PostError>;

    /// Feed: recent posts from the requester and everyone they follow
    async fn get_feed(
        &self,
        requester_id: i64,
        before: Option<i64>,
        limit: Option<i32>,
    ) -> Result<Vec<PostDto>, PostError>;

    /// Like a post; idempotent
    async fn like_post(&self, post_id: i64, user_id: i64) -> Result<(), PostError>;

    /// Unlike a post; idempotent
    async fn unlike_post(&self, post_id: i64, user_id: i64) -> Result<(), PostError>;

    /// Comment on a post
    async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        body: &str,
    ) -> Result<CommentDto, PostError>;

    /// List comments on a post in chronological order
    async fn get_comments(&self, post_id: i64) -> Result<Vec<CommentDto>, PostError>;
}

/// Create post request
#[derive(Debug, Clone)]
pub struct CreatePostDto {
    pub body: String,
    pub image_url: Option<String>,
}

/// Post data transfer object
#[derive(Debug, Clone)]
pub struct PostDto {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub liked_by_me: bool,
    pub created_at: String,
}

/// Comment data transfer object
#[derive(Debug, Clone)]
pub struct CommentDto {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            post_id: comment.post_id.to_string(),
            author_id: comment.author_id.to_string(),
            body: comment.body,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Post service errors
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Post not found")]
    NotFound,

    #[error("Permission denied")]
    Forbidden,

    #[error("Post body must not be empty")]
    EmptyBody,

    #[error("Post body too long")]
    BodyTooLong,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// PostService implementation
pub struct PostServiceImpl<P, F>
where
    P: PostRepository,
    F: FollowRepository,
{
    post_repo: Arc<P>,
    follow_repo: Arc<F>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<P, F> PostServiceImpl<P, F>
where
    P: PostRepository,
    F: FollowRepository,
{
    pub fn new(post_repo: Arc<P>, follow_repo: Arc<F>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            post_repo,
            follow_repo,
            id_generator,
        }
    }

    fn validate_body(body: &str, max: usize) -> Result<String, PostError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(PostError::EmptyBody);
        }
        if trimmed.chars().count() > max {
            return Err(PostError::BodyTooLong);
        }
        Ok(trimmed.to_string())
    }

    async fn to_dto(&self, post: Post, requester_id: i64) -> Result<PostDto, PostError> {
        let like_count = self
            .post_repo
            .count_likes(post.id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;
        let liked_by_me = self
            .post_repo
            .has_liked(post.id, requester_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;

        Ok(PostDto {
            id: post.id.to_string(),
            author_id: post.author_id.to_string(),
            body: post.body,
            image_url: post.image_url,
            like_count,
            liked_by_me,
            created_at: post.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl<P, F> PostService for PostServiceImpl<P, F>
where
    P: PostRepository + 'static,
    F: FollowRepository + 'static,
{
    async fn create_post(&self, author_id: i64, request: CreatePostDto) -> Result<PostDto, PostError> {
        let body = Self::validate_body(&request.body, 4000)?;

        let post = Post {
            id: self.id_generator.generate(),
            author_id,
            body,
            image_url: request.image_url,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let created = self
            .post_repo
            .create(&post)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;

        self.to_dto(created, author_id).await
    }

    async fn get_post(&self, requester_id: i64, post_id: i64) -> Result<PostDto, PostError> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?
            .ok_or(PostError::NotFound)?;

        self.to_dto(post, requester_id).await
    }

    async fn delete_post(&self, post_id: i64, actor_id: i64) -> Result<(), PostError> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?
            .ok_or(PostError::NotFound)?;

        if post.author_id != actor_id {
            return Err(PostError::Forbidden);
        }

        self.post_repo
            .delete(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;

        Ok(())
    }

    async fn get_feed(
        &self,
        requester_id: i64,
        before: Option<i64>,
        limit: Option<i32>,
    ) -> Result<Vec<PostDto>, PostError> {
        let limit = limit.unwrap_or(50).clamp(1, 100);

        let mut author_ids = self
            .follow_repo
            .following_ids(requester_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;
        author_ids.push(requester_id);

        let posts = self
            .post_repo
            .find_feed(&author_ids, before, limit)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;

        let mut dtos = Vec::with_capacity(posts.len());
        for post in posts {
            dtos.push(self.to_dto(post, requester_id).await?);
        }
        Ok(dtos)
    }

    async fn like_post(&self, post_id: i64, user_id: i64) -> Result<(), PostError> {
        // Surface missing posts before touching the likes table
        self.post_repo
            .find_by_id(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?
            .ok_or(PostError::NotFound)?;

        self.post_repo
            .like(post_id, user_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))
    }

    async fn unlike_post(&self, post_id: i64, user_id: i64) -> Result<(), PostError> {
        self.post_repo
            .unlike(post_id, user_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))
    }

    async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        body: &str,
    ) -> Result<CommentDto, PostError> {
        let body = Self::validate_body(body, 2000)?;

        self.post_repo
            .find_by_id(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?
            .ok_or(PostError::NotFound)?;

        let comment = Comment {
            id: self.id_generator.generate(),
            post_id,
            author_id,
            body,
            created_at: Utc::now(),
        };

        let created = self
            .post_repo
            .add_comment(&comment)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;

        Ok(CommentDto::from(created))
    }

    async fn get_comments(&self, post_id: i64) -> Result<Vec<CommentDto>, PostError> {
        self.post_repo
            .find_by_id(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?
            .ok_or(PostError::NotFound)?;

        let comments = self
            .post_repo
            .find_comments(post_id)
            .await
            .map_err(|e| PostError::Internal(e.to_string()))?;

        Ok(comments.into_iter().map(CommentDto::from).collect())
    }
}

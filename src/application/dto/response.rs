//! Response DTOs
//!
//! Data structures for API response bodies.

use serde::Serialize;

use crate::application::services::{
    AuthTokens, ChannelDto, ChannelMessageDto, CommentDto, CommunityDto, ConversationMessageDto,
    NotificationDto, PostDto, ProfileDto, RecommendedUserDto, UserDto,
};

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// Registration response (includes user and tokens)
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_dto(dto: UserDto, include_email: bool) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            email: if include_email { Some(dto.email) } else { None },
            display_name: dto.display_name,
            avatar_url: dto.avatar_url,
            bio: dto.bio,
            created_at: dto.created_at,
        }
    }
}

/// Profile response (public view with counts)
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
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

impl From<ProfileDto> for ProfileResponse {
    fn from(dto: ProfileDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            display_name: dto.display_name,
            avatar_url: dto.avatar_url,
            bio: dto.bio,
            post_count: dto.post_count,
            follower_count: dto.follower_count,
            following_count: dto.following_count,
            followed_by_me: dto.followed_by_me,
        }
    }
}

/// Recommended user response
#[derive(Debug, Serialize)]
pub struct RecommendedUserResponse {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub mutual_count: i64,
}

impl From<RecommendedUserDto> for RecommendedUserResponse {
    fn from(dto: RecommendedUserDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            display_name: dto.display_name,
            avatar_url: dto.avatar_url,
            mutual_count: dto.mutual_count,
        }
    }
}

/// Post response
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub liked_by_me: bool,
    pub created_at: String,
}

impl From<PostDto> for PostResponse {
    fn from(dto: PostDto) -> Self {
        Self {
            id: dto.id,
            author_id: dto.author_id,
            body: dto.body,
            image_url: dto.image_url,
            like_count: dto.like_count,
            liked_by_me: dto.liked_by_me,
            created_at: dto.created_at,
        }
    }
}

/// Comment response
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<CommentDto> for CommentResponse {
    fn from(dto: CommentDto) -> Self {
        Self {
            id: dto.id,
            post_id: dto.post_id,
            author_id: dto.author_id,
            body: dto.body,
            created_at: dto.created_at,
        }
    }
}

/// Notification response
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub actor_id: String,
    pub kind: String,
    pub read: bool,
    pub created_at: String,
}

impl From<NotificationDto> for NotificationResponse {
    fn from(dto: NotificationDto) -> Self {
        Self {
            id: dto.id,
            actor_id: dto.actor_id,
            kind: dto.kind,
            read: dto.read,
            created_at: dto.created_at,
        }
    }
}

/// Community response
#[derive(Debug, Serialize)]
pub struct CommunityResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub member_count: i64,
    pub created_at: String,
}

impl From<CommunityDto> for CommunityResponse {
    fn from(dto: CommunityDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            owner_id: dto.owner_id,
            description: dto.description,
            icon_url: dto.icon_url,
            member_count: dto.member_count,
            created_at: dto.created_at,
        }
    }
}

/// Channel response
#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: String,
    pub community_id: String,
    pub name: String,
    pub kind: String,
    pub topic: Option<String>,
    pub position: i32,
    pub parent_id: Option<String>,
    pub created_at: String,
}

impl From<ChannelDto> for ChannelResponse {
    fn from(dto: ChannelDto) -> Self {
        Self {
            id: dto.id,
            community_id: dto.community_id,
            name: dto.name,
            kind: dto.kind,
            topic: dto.topic,
            position: dto.position,
            parent_id: dto.parent_id,
            created_at: dto.created_at,
        }
    }
}

/// Channel message response
#[derive(Debug, Serialize)]
pub struct ChannelMessageResponse {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub sender_display_name: Option<String>,
    pub content: String,
    pub attachments: Vec<String>,
    pub created_at: String,
}

impl From<ChannelMessageDto> for ChannelMessageResponse {
    fn from(dto: ChannelMessageDto) -> Self {
        Self {
            id: dto.id,
            channel_id: dto.channel_id,
            sender_id: dto.sender_id,
            sender_display_name: dto.sender_display_name,
            content: dto.content,
            attachments: dto.attachments,
            created_at: dto.created_at,
        }
    }
}

/// Conversation message response
#[derive(Debug, Serialize)]
pub struct ConversationMessageResponse {
    pub id: String,
    pub room_key: String,
    pub sender_id: String,
    pub content: String,
    pub delivered: bool,
    pub seen: bool,
    pub created_at: String,
}

impl From<ConversationMessageDto> for ConversationMessageResponse {
    fn from(dto: ConversationMessageDto) -> Self {
        Self {
            id: dto.id,
            room_key: dto.room_key,
            sender_id: dto.sender_id,
            content: dto.content,
            delivered: dto.delivered,
            seen: dto.seen,
            created_at: dto.created_at,
        }
    }
}

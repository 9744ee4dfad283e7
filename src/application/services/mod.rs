//! Application Services
//!
//! Business logic services orchestrating domain entities and repositories.
//! Each service owns its error enum; handlers map those onto HTTP statuses.

pub mod auth_service;
pub mod chat_service;
pub mod community_service;
pub mod conversation_service;
pub mod follow_service;
pub mod post_service;
pub mod user_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims};
pub use chat_service::{
    ChatError, ChatService, ChatServiceImpl, ChannelMessageDto, HISTORY_PAGE_CAP, MAX_MESSAGE_LEN,
};
pub use community_service::{
    ChannelDto, CommunityDto, CommunityError, CommunityService, CommunityServiceImpl,
    CreateChannelDto, CreateCommunityDto, UpdateChannelDto,
};
pub use conversation_service::{
    ConversationError, ConversationMessageDto, ConversationService, ConversationServiceImpl,
};
pub use follow_service::{
    FollowError, FollowService, FollowServiceImpl, NotificationDto, RecommendedUserDto,
};
pub use post_service::{
    CommentDto, CreatePostDto, PostDto, PostError, PostService, PostServiceImpl,
};
pub use user_service::{
    ProfileDto, UpdateUserDto, UserDto, UserError, UserService, UserServiceImpl,
};

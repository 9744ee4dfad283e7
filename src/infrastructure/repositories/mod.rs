//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! This module provides concrete implementations of the repository traits
//! defined in the domain layer. Each repository handles data access for
//! a specific entity type.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - User account management
//! - **SessionRepository** - Refresh-token sessions
//! - **PostRepository** - Posts with likes and comments
//! - **FollowRepository** - Follow graph, friends, recommendations
//! - **NotificationRepository** - Follow notifications
//! - **CommunityRepository** - Community records
//! - **MembershipRepository** - Community memberships and roles
//! - **ChannelRepository** - Channels within communities
//! - **ChannelMessageRepository** - Channel message history
//! - **ConversationRepository** - Direct-message rooms

pub mod channel_message_repository;
pub mod channel_repository;
pub mod community_repository;
pub mod conversation_repository;
pub mod follow_repository;
pub mod membership_repository;
pub mod notification_repository;
pub mod post_repository;
pub mod session_repository;
pub mod user_repository;

pub use channel_message_repository::PgChannelMessageRepository;
pub use channel_repository::PgChannelRepository;
pub use community_repository::PgCommunityRepository;
pub use conversation_repository::PgConversationRepository;
pub use follow_repository::PgFollowRepository;
pub use membership_repository::PgMembershipRepository;
pub use notification_repository::PgNotificationRepository;
pub use post_repository::PgPostRepository;
pub use session_repository::PgSessionRepository;
pub use user_repository::PgUserRepository;

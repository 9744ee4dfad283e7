//! # Domain Entities
//!
//! Core domain entities representing the main business objects.
//! All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **User**: User account with authentication data and profile
//! - **Post**: A timeline post with likes and comments
//! - **Follow**: A directed edge in the follow graph
//! - **Notification**: Fan-in record for follow actions
//! - **Community**: A Discord-like server with channels and members
//! - **Channel**: A communication space within a community
//! - **ChannelMessage**: A text message sent in a channel
//! - **Conversation**: A direct-message room keyed by participant pair

pub mod channel;
pub mod channel_message;
pub mod community;
pub mod conversation;
pub mod follow;
pub mod notification;
pub mod post;
pub mod session;
pub mod user;

pub use channel::{slugify_name, Channel, ChannelKind, ChannelRepository};
pub use channel_message::{ChannelMessage, ChannelMessageRepository};
pub use community::{
    Community, CommunityRepository, MemberRole, Membership, MembershipRepository,
};
pub use conversation::{
    parse_room_key, room_key, Conversation, ConversationMessage, ConversationRepository,
};
pub use follow::{Follow, FollowRepository, RecommendedUser};
pub use notification::{Notification, NotificationKind, NotificationRepository};
pub use post::{Comment, Post, PostLike, PostRepository};
pub use session::{Session, SessionRepository};
pub use user::{User, UserRepository};

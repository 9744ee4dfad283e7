//! Chat Service
//!
//! Channel message sending and history. Both the WebSocket gateway and the
//! REST fallback run through this service, so validation and authorization
//! are identical on either path. Persistence happens here; broadcasting is
//! the gateway's job and only ever follows a successful persist.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    ChannelMessage, ChannelMessageRepository, ChannelRepository, MembershipRepository,
    UserRepository,
};
use crate::shared::snowflake::SnowflakeGenerator;

/// Maximum message length in characters
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Default and maximum history page size
pub const HISTORY_PAGE_CAP: i32 = 50;

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Persist a channel message after authorization and validation.
    ///
    /// The returned DTO is enriched with the sender's display identity for
    /// broadcast payloads.
    async fn send_message(
        &self,
        channel_id: i64,
        sender_id: i64,
        content: &str,
        attachments: Vec<String>,
    ) -> Result<ChannelMessageDto, ChatError>;

    /// Paginated history in chronological order.
    ///
    /// `limit` is clamped to [1, 50] with a default of 50; `page` is
    /// 1-based. Storage returns newest-first pages which are re-reversed
    /// here.
    async fn get_history(
        &self,
        channel_id: i64,
        requester_id: i64,
        page: Option<i32>,
        limit: Option<i32>,
    ) -> Result<Vec<ChannelMessageDto>, ChatError>;

    /// Capability check used by the gateway at room-join time.
    async fn authorize_subscribe(&self, channel_id: i64, user_id: i64) -> Result<(), ChatError>;
}

/// Channel message data transfer object
#[derive(Debug, Clone)]
pub struct ChannelMessageDto {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub sender_display_name: Option<String>,
    pub content: String,
    pub attachments: Vec<String>,
    pub created_at: String,
}

impl ChannelMessageDto {
    fn from_message(message: ChannelMessage, sender_display_name: Option<String>) -> Self {
        Self {
            id: message.id.to_string(),
            channel_id: message.channel_id.to_string(),
            sender_id: message.sender_id.to_string(),
            sender_display_name,
            content: message.content,
            attachments: message.attachments,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Chat service errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Channel not found")]
    ChannelNotFound,

    #[error("Not a member of this community")]
    Forbidden,

    #[error("Voice channels do not accept messages")]
    VoiceChannel,

    #[error("Message text must not be empty")]
    EmptyText,

    #[error("Message text too long")]
    TextTooLong,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ChatService implementation
pub struct ChatServiceImpl<Ch, M, Msg, U>
where
    Ch: ChannelRepository,
    M: MembershipRepository,
    Msg: ChannelMessageRepository,
    U: UserRepository,
{
    channel_repo: Arc<Ch>,
    membership_repo: Arc<M>,
    message_repo: Arc<Msg>,
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<Ch, M, Msg, U> ChatServiceImpl<Ch, M, Msg, U>
where
    Ch: ChannelRepository,
    M: MembershipRepository,
    Msg: ChannelMessageRepository,
    U: UserRepository,
{
    pub fn new(
        channel_repo: Arc<Ch>,
        membership_repo: Arc<M>,
        message_repo: Arc<Msg>,
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            channel_repo,
            membership_repo,
            message_repo,
            user_repo,
            id_generator,
        }
    }

    /// Load the channel and verify the user may act in it.
    ///
    /// A missing channel is not-found and takes precedence over the
    /// membership check.
    async fn load_authorized_channel(
        &self,
        channel_id: i64,
        user_id: i64,
    ) -> Result<crate::domain::Channel, ChatError> {
        let channel = self
            .channel_repo
            .find_by_id(channel_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::ChannelNotFound)?;

        let is_member = self
            .membership_repo
            .is_member(channel.community_id, user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;
        if !is_member {
            return Err(ChatError::Forbidden);
        }

        Ok(channel)
    }

    fn validate_text(content: &str) -> Result<String, ChatError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyText);
        }
        if trimmed.chars().count() > MAX_MESSAGE_LEN {
            return Err(ChatError::TextTooLong);
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl<Ch, M, Msg, U> ChatService for ChatServiceImpl<Ch, M, Msg, U>
where
    Ch: ChannelRepository + 'static,
    M: MembershipRepository + 'static,
    Msg: ChannelMessageRepository + 'static,
    U: UserRepository + 'static,
{
    async fn send_message(
        &self,
        channel_id: i64,
        sender_id: i64,
        content: &str,
        attachments: Vec<String>,
    ) -> Result<ChannelMessageDto, ChatError> {
        let channel = self.load_authorized_channel(channel_id, sender_id).await?;

        if !channel.accepts_messages() {
            return Err(ChatError::VoiceChannel);
        }

        let content = Self::validate_text(content)?;

        let message = ChannelMessage {
            id: self.id_generator.generate(),
            channel_id,
            sender_id,
            content,
            attachments,
            created_at: Utc::now(),
        };

        let persisted = self
            .message_repo
            .create(&message)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        // Reload the sender so broadcast payloads carry a display identity
        let sender = self
            .user_repo
            .find_by_id(sender_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;
        let display_name = sender.map(|u| u.display_name_or_username().to_string());

        Ok(ChannelMessageDto::from_message(persisted, display_name))
    }

    async fn get_history(
        &self,
        channel_id: i64,
        requester_id: i64,
        page: Option<i32>,
        limit: Option<i32>,
    ) -> Result<Vec<ChannelMessageDto>, ChatError> {
        self.load_authorized_channel(channel_id, requester_id).await?;

        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(HISTORY_PAGE_CAP).clamp(1, HISTORY_PAGE_CAP);

        let mut messages = self
            .message_repo
            .find_page(channel_id, page, limit)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        // Storage order is newest-first; history reads oldest-first
        messages.reverse();

        Ok(messages
            .into_iter()
            .map(|m| ChannelMessageDto::from_message(m, None))
            .collect())
    }

    async fn authorize_subscribe(&self, channel_id: i64, user_id: i64) -> Result<(), ChatError> {
        self.load_authorized_channel(channel_id, user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, ChannelKind, Membership, User};
    use crate::shared::error::AppError;
    use std::sync::Mutex;

    struct FakeChannelRepo {
        channels: Vec<Channel>,
    }

    #[async_trait]
    impl ChannelRepository for FakeChannelRepo {
        async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
            Ok(self.channels.iter().find(|c| c.id == id).cloned())
        }
        async fn find_by_community(&self, community_id: i64) -> Result<Vec<Channel>, AppError> {
            Ok(self
                .channels
                .iter()
                .filter(|c| c.community_id == community_id)
                .cloned()
                .collect())
        }
        async fn name_exists(&self, community_id: i64, name: &str) -> Result<bool, AppError> {
            Ok(self
                .channels
                .iter()
                .any(|c| c.community_id == community_id && c.name == name))
        }
        async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
            Ok(channel.clone())
        }
        async fn update(&self, channel: &Channel) -> Result<Channel, AppError> {
            Ok(channel.clone())
        }
        async fn delete(&self, _id: i64) -> Result<(), AppError> {
            Ok(())
        }
    }

    struct FakeMembershipRepo {
        memberships: Vec<Membership>,
    }

    #[async_trait]
    impl MembershipRepository for FakeMembershipRepo {
        async fn find(
            &self,
            community_id: i64,
            user_id: i64,
        ) -> Result<Option<Membership>, AppError> {
            Ok(self
                .memberships
                .iter()
                .find(|m| m.community_id == community_id && m.user_id == user_id)
                .cloned())
        }
        async fn create(&self, membership: &Membership) -> Result<Membership, AppError> {
            Ok(membership.clone())
        }
        async fn delete(&self, _community_id: i64, _user_id: i64) -> Result<(), AppError> {
            Ok(())
        }
        async fn is_member(&self, community_id: i64, user_id: i64) -> Result<bool, AppError> {
            Ok(self
                .memberships
                .iter()
                .any(|m| m.community_id == community_id && m.user_id == user_id))
        }
        async fn count_by_community(&self, community_id: i64) -> Result<i64, AppError> {
            Ok(self
                .memberships
                .iter()
                .filter(|m| m.community_id == community_id)
                .count() as i64)
        }
    }

    struct FakeMessageRepo {
        messages: Mutex<Vec<ChannelMessage>>,
    }

    #[async_trait]
    impl ChannelMessageRepository for FakeMessageRepo {
        async fn create(&self, message: &ChannelMessage) -> Result<ChannelMessage, AppError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(message.clone())
        }
        async fn find_page(
            &self,
            channel_id: i64,
            page: i32,
            limit: i32,
        ) -> Result<Vec<ChannelMessage>, AppError> {
            let messages = self.messages.lock().unwrap();
            let mut in_channel: Vec<ChannelMessage> = messages
                .iter()
                .filter(|m| m.channel_id == channel_id)
                .cloned()
                .collect();
            in_channel.sort_by_key(|m| std::cmp::Reverse(m.id));
            let offset = ((page.max(1) - 1) * limit) as usize;
            Ok(in_channel
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect())
        }
        async fn count_by_channel(&self, channel_id: i64) -> Result<i64, AppError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.channel_id == channel_id)
                .count() as i64)
        }
    }

    struct FakeUserRepo {
        users: Vec<User>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, AppError> {
            Ok(None)
        }
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, AppError> {
            Ok(None)
        }
        async fn create(&self, user: &User) -> Result<User, AppError> {
            Ok(user.clone())
        }
        async fn update(&self, user: &User) -> Result<User, AppError> {
            Ok(user.clone())
        }
        async fn email_exists(&self, _email: &str) -> Result<bool, AppError> {
            Ok(false)
        }
        async fn username_exists(&self, _username: &str) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    const COMMUNITY: i64 = 100;
    const TEXT_CHANNEL: i64 = 1;
    const VOICE_CHANNEL: i64 = 2;
    const MEMBER: i64 = 10;
    const OUTSIDER: i64 = 99;

    fn test_channel(id: i64, kind: ChannelKind) -> Channel {
        Channel {
            id,
            community_id: COMMUNITY,
            name: "general".into(),
            kind,
            topic: None,
            position: 0,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn build_service() -> ChatServiceImpl<FakeChannelRepo, FakeMembershipRepo, FakeMessageRepo, FakeUserRepo>
    {
        ChatServiceImpl::new(
            Arc::new(FakeChannelRepo {
                channels: vec![
                    test_channel(TEXT_CHANNEL, ChannelKind::Text),
                    test_channel(VOICE_CHANNEL, ChannelKind::Voice),
                ],
            }),
            Arc::new(FakeMembershipRepo {
                memberships: vec![Membership::new(COMMUNITY, MEMBER)],
            }),
            Arc::new(FakeMessageRepo {
                messages: Mutex::new(Vec::new()),
            }),
            Arc::new(FakeUserRepo {
                users: vec![User {
                    id: MEMBER,
                    username: "alice".into(),
                    display_name: Some("Alice".into()),
                    ..Default::default()
                }],
            }),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[tokio::test]
    async fn test_send_persists_and_enriches_display_name() {
        let service = build_service();

        let dto = service
            .send_message(TEXT_CHANNEL, MEMBER, "hello", vec![])
            .await
            .unwrap();

        assert_eq!(dto.content, "hello");
        assert_eq!(dto.sender_display_name.as_deref(), Some("Alice"));

        let history = service
            .get_history(TEXT_CHANNEL, MEMBER, None, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello");
    }

    #[tokio::test]
    async fn test_send_rejects_empty_text_without_persisting() {
        let service = build_service();

        assert!(matches!(
            service.send_message(TEXT_CHANNEL, MEMBER, "   \t ", vec![]).await,
            Err(ChatError::EmptyText)
        ));

        let history = service
            .get_history(TEXT_CHANNEL, MEMBER, None, None)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_send_trims_whitespace() {
        let service = build_service();

        let dto = service
            .send_message(TEXT_CHANNEL, MEMBER, "  hi there  ", vec![])
            .await
            .unwrap();
        assert_eq!(dto.content, "hi there");
    }

    #[tokio::test]
    async fn test_voice_channel_rejects_messages() {
        let service = build_service();

        assert!(matches!(
            service.send_message(VOICE_CHANNEL, MEMBER, "hello", vec![]).await,
            Err(ChatError::VoiceChannel)
        ));
    }

    #[tokio::test]
    async fn test_non_member_is_forbidden() {
        let service = build_service();

        assert!(matches!(
            service.send_message(TEXT_CHANNEL, OUTSIDER, "hello", vec![]).await,
            Err(ChatError::Forbidden)
        ));
        assert!(matches!(
            service.get_history(TEXT_CHANNEL, OUTSIDER, None, None).await,
            Err(ChatError::Forbidden)
        ));
        assert!(matches!(
            service.authorize_subscribe(TEXT_CHANNEL, OUTSIDER).await,
            Err(ChatError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_missing_channel_takes_precedence_over_membership() {
        let service = build_service();

        // Even a non-member gets not-found for a channel that does not exist
        assert!(matches!(
            service.get_history(555, OUTSIDER, None, None).await,
            Err(ChatError::ChannelNotFound)
        ));
        assert!(matches!(
            service.send_message(555, MEMBER, "hello", vec![]).await,
            Err(ChatError::ChannelNotFound)
        ));
    }

    #[tokio::test]
    async fn test_history_page_returns_newest_in_chronological_order() {
        let service = build_service();

        for text in ["one", "two", "three", "four", "five"] {
            service
                .send_message(TEXT_CHANNEL, MEMBER, text, vec![])
                .await
                .unwrap();
        }

        let page = service
            .get_history(TEXT_CHANNEL, MEMBER, Some(1), Some(2))
            .await
            .unwrap();

        // The two most recent messages, oldest of the pair first
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "four");
        assert_eq!(page[1].content, "five");
    }

    #[tokio::test]
    async fn test_history_limit_clamped_to_cap() {
        let service = build_service();

        for i in 0..60 {
            service
                .send_message(TEXT_CHANNEL, MEMBER, &format!("msg {}", i), vec![])
                .await
                .unwrap();
        }

        let page = service
            .get_history(TEXT_CHANNEL, MEMBER, Some(1), Some(100))
            .await
            .unwrap();
        assert_eq!(page.len(), HISTORY_PAGE_CAP as usize);

        let page = service
            .get_history(TEXT_CHANNEL, MEMBER, Some(1), Some(0))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }
}

//! Conversation Service
//!
//! Direct-message rooms. The room key is a pure function of the participant
//! pair; the room itself is upserted together with the first message. Both
//! the gateway and the REST fallback run through this service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    parse_room_key, room_key, Conversation, ConversationMessage, ConversationRepository,
    UserRepository,
};
use crate::shared::snowflake::SnowflakeGenerator;

use super::chat_service::MAX_MESSAGE_LEN;

/// Conversation service trait
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Send a direct message to a recipient, deriving the room key and
    /// creating the room on first use.
    async fn send_message(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &str,
    ) -> Result<ConversationMessageDto, ConversationError>;

    /// Send into an existing key (REST fallback path). The sender must be
    /// one of the two participants encoded in the key.
    async fn send_by_key(
        &self,
        sender_id: i64,
        key: &str,
        content: &str,
    ) -> Result<ConversationMessageDto, ConversationError>;

    /// Full history for a room in chronological order. The requester must
    /// be a participant.
    async fn get_history(
        &self,
        requester_id: i64,
        key: &str,
    ) -> Result<Vec<ConversationMessageDto>, ConversationError>;

    /// Capability check used by the gateway at room-join time.
    async fn authorize_subscribe(&self, user_id: i64, key: &str) -> Result<(), ConversationError>;
}

/// Conversation message data transfer object
#[derive(Debug, Clone)]
pub struct ConversationMessageDto {
    pub id: String,
    pub room_key: String,
    pub sender_id: String,
    pub content: String,
    pub delivered: bool,
    pub seen: bool,
    pub created_at: String,
}

impl From<ConversationMessage> for ConversationMessageDto {
    fn from(message: ConversationMessage) -> Self {
        Self {
            id: message.id.to_string(),
            room_key: message.room_key,
            sender_id: message.sender_id.to_string(),
            content: message.content,
            delivered: message.delivered,
            seen: message.seen,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Conversation service errors
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Invalid room key")]
    InvalidKey,

    #[error("Not a participant of this conversation")]
    Forbidden,

    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("Message text must not be empty")]
    EmptyText,

    #[error("Message text too long")]
    TextTooLong,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ConversationService implementation
pub struct ConversationServiceImpl<C, U>
where
    C: ConversationRepository,
    U: UserRepository,
{
    conversation_repo: Arc<C>,
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, U> ConversationServiceImpl<C, U>
where
    C: ConversationRepository,
    U: UserRepository,
{
    pub fn new(
        conversation_repo: Arc<C>,
        user_repo: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            conversation_repo,
            user_repo,
            id_generator,
        }
    }

    fn validate_text(content: &str) -> Result<String, ConversationError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ConversationError::EmptyText);
        }
        if trimmed.chars().count() > MAX_MESSAGE_LEN {
            return Err(ConversationError::TextTooLong);
        }
        Ok(trimmed.to_string())
    }

    /// Parse a key and verify the user appears in it.
    fn authorized_pair(user_id: i64, key: &str) -> Result<(i64, i64), ConversationError> {
        let (a, b) = parse_room_key(key).ok_or(ConversationError::InvalidKey)?;
        if user_id != a && user_id != b {
            return Err(ConversationError::Forbidden);
        }
        Ok((a, b))
    }

    async fn persist(
        &self,
        sender_id: i64,
        user_a: i64,
        user_b: i64,
        content: String,
    ) -> Result<ConversationMessageDto, ConversationError> {
        let key = room_key(user_a, user_b);
        let conversation = Conversation {
            room_key: key.clone(),
            user_a: user_a.min(user_b),
            user_b: user_a.max(user_b),
            created_at: Utc::now(),
        };
        let message = ConversationMessage {
            id: self.id_generator.generate(),
            room_key: key,
            sender_id,
            content,
            delivered: false,
            seen: false,
            created_at: Utc::now(),
        };

        let persisted = self
            .conversation_repo
            .append_message(&conversation, &message)
            .await
            .map_err(|e| ConversationError::Internal(e.to_string()))?;

        Ok(ConversationMessageDto::from(persisted))
    }
}

#[async_trait]
impl<C, U> ConversationService for ConversationServiceImpl<C, U>
where
    C: ConversationRepository + 'static,
    U: UserRepository + 'static,
{
    async fn send_message(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &str,
    ) -> Result<ConversationMessageDto, ConversationError> {
        let content = Self::validate_text(content)?;

        self.user_repo
            .find_by_id(recipient_id)
            .await
            .map_err(|e| ConversationError::Internal(e.to_string()))?
            .ok_or(ConversationError::RecipientNotFound)?;

        self.persist(sender_id, sender_id, recipient_id, content).await
    }

    async fn send_by_key(
        &self,
        sender_id: i64,
        key: &str,
        content: &str,
    ) -> Result<ConversationMessageDto, ConversationError> {
        let content = Self::validate_text(content)?;
        let (a, b) = Self::authorized_pair(sender_id, key)?;

        self.persist(sender_id, a, b, content).await
    }

    async fn get_history(
        &self,
        requester_id: i64,
        key: &str,
    ) -> Result<Vec<ConversationMessageDto>, ConversationError> {
        Self::authorized_pair(requester_id, key)?;

        let messages = self
            .conversation_repo
            .find_messages(key)
            .await
            .map_err(|e| ConversationError::Internal(e.to_string()))?;

        Ok(messages.into_iter().map(ConversationMessageDto::from).collect())
    }

    async fn authorize_subscribe(&self, user_id: i64, key: &str) -> Result<(), ConversationError> {
        Self::authorized_pair(user_id, key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::shared::error::AppError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeConversationRepo {
        conversations: Mutex<Vec<Conversation>>,
        messages: Mutex<Vec<ConversationMessage>>,
    }

    #[async_trait]
    impl ConversationRepository for FakeConversationRepo {
        async fn find_by_key(&self, key: &str) -> Result<Option<Conversation>, AppError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.room_key == key)
                .cloned())
        }

        async fn append_message(
            &self,
            conversation: &Conversation,
            message: &ConversationMessage,
        ) -> Result<ConversationMessage, AppError> {
            let mut conversations = self.conversations.lock().unwrap();
            if !conversations.iter().any(|c| c.room_key == conversation.room_key) {
                conversations.push(conversation.clone());
            }
            self.messages.lock().unwrap().push(message.clone());
            Ok(message.clone())
        }

        async fn find_messages(&self, key: &str) -> Result<Vec<ConversationMessage>, AppError> {
            let mut messages: Vec<ConversationMessage> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.room_key == key)
                .cloned()
                .collect();
            messages.sort_by_key(|m| m.id);
            Ok(messages)
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

    const ALICE: i64 = 7;
    const BOB: i64 = 13;
    const EVE: i64 = 99;

    fn build_service() -> ConversationServiceImpl<FakeConversationRepo, FakeUserRepo> {
        ConversationServiceImpl::new(
            Arc::new(FakeConversationRepo::default()),
            Arc::new(FakeUserRepo {
                users: vec![
                    User { id: ALICE, username: "alice".into(), ..Default::default() },
                    User { id: BOB, username: "bob".into(), ..Default::default() },
                ],
            }),
            Arc::new(SnowflakeGenerator::new(1, 0)),
        )
    }

    #[tokio::test]
    async fn test_first_message_creates_room_with_sorted_key() {
        let service = build_service();

        let dto = service.send_message(ALICE, BOB, "hi").await.unwrap();
        // "13" < "7" lexicographically
        assert_eq!(dto.room_key, "13_7");
        assert_eq!(dto.content, "hi");
        assert_eq!(dto.sender_id, ALICE.to_string());

        // Both participants read the same single-message history
        let key = room_key(ALICE, BOB);
        let seen_by_alice = service.get_history(ALICE, &key).await.unwrap();
        let seen_by_bob = service.get_history(BOB, &key).await.unwrap();
        assert_eq!(seen_by_alice.len(), 1);
        assert_eq!(seen_by_bob.len(), 1);
        assert_eq!(seen_by_alice[0].content, "hi");
    }

    #[tokio::test]
    async fn test_key_is_symmetric_across_directions() {
        let service = build_service();

        service.send_message(ALICE, BOB, "from alice").await.unwrap();
        service.send_message(BOB, ALICE, "from bob").await.unwrap();

        let history = service.get_history(ALICE, &room_key(BOB, ALICE)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "from alice");
        assert_eq!(history[1].content, "from bob");
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_persisting() {
        let service = build_service();

        assert!(matches!(
            service.send_message(ALICE, BOB, "  \n ").await,
            Err(ConversationError::EmptyText)
        ));

        let history = service.get_history(ALICE, &room_key(ALICE, BOB)).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_recipient_rejected() {
        let service = build_service();

        assert!(matches!(
            service.send_message(ALICE, 12345, "hi").await,
            Err(ConversationError::RecipientNotFound)
        ));
    }

    #[tokio::test]
    async fn test_non_participant_cannot_read_or_send() {
        let service = build_service();
        service.send_message(ALICE, BOB, "secret").await.unwrap();

        let key = room_key(ALICE, BOB);
        assert!(matches!(
            service.get_history(EVE, &key).await,
            Err(ConversationError::Forbidden)
        ));
        assert!(matches!(
            service.send_by_key(EVE, &key, "intrusion").await,
            Err(ConversationError::Forbidden)
        ));
        assert!(matches!(
            service.authorize_subscribe(EVE, &key).await,
            Err(ConversationError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_malformed_key_rejected() {
        let service = build_service();

        assert!(matches!(
            service.get_history(ALICE, "not-a-key").await,
            Err(ConversationError::InvalidKey)
        ));
        // Non-canonical ordering is rejected rather than silently remapped
        assert!(matches!(
            service.get_history(ALICE, "7_13").await,
            Err(ConversationError::InvalidKey)
        ));
    }

    #[tokio::test]
    async fn test_send_by_key_appends_for_participant() {
        let service = build_service();
        let key = room_key(ALICE, BOB);

        service.send_by_key(BOB, &key, "rest fallback").await.unwrap();

        let history = service.get_history(ALICE, &key).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender_id, BOB.to_string());
    }
}

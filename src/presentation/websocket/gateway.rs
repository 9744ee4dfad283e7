//! WebSocket Gateway
//!
//! Connects identified connections to rooms and relays newly created
//! messages. Every send persists through the service layer first; the
//! broadcast is only attempted after the persist succeeds, so a message
//! visible on a socket is always present in history.
//!
//! Authorization is explicit at this layer: joins and sends carry the
//! verified caller identity and run the same membership predicates as the
//! REST surface.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::dto::response::{ChannelMessageResponse, ConversationMessageResponse};
use crate::application::services::{
    ChannelMessageDto, ChatError, ChatService, ConversationError, ConversationMessageDto,
    ConversationService,
};
use crate::domain::room_key;
use crate::infrastructure::metrics;

use super::messages::{GatewaySend, CHANNEL_MESSAGE_CREATE, DIRECT_MESSAGE_CREATE};
use super::registry::{channel_room, dm_room, RoomRegistry};

/// A live, identified connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: String,
    pub user_id: i64,
    pub sender: mpsc::UnboundedSender<GatewaySend>,
}

/// Target of a direct message: an existing room key or a recipient id.
#[derive(Debug, Clone)]
pub enum DirectMessageTarget {
    RoomKey(String),
    Recipient(i64),
}

/// Gateway command errors, surfaced to clients as error Acks.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid: {0}")]
    Invalid(String),

    #[error("Internal error")]
    Internal,
}

impl From<ChatError> for GatewayError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::ChannelNotFound => GatewayError::NotFound(e.to_string()),
            ChatError::Forbidden => GatewayError::Forbidden(e.to_string()),
            ChatError::VoiceChannel | ChatError::EmptyText | ChatError::TextTooLong => {
                GatewayError::Invalid(e.to_string())
            }
            ChatError::Internal(detail) => {
                tracing::error!("Chat persistence failed: {}", detail);
                GatewayError::Internal
            }
        }
    }
}

impl From<ConversationError> for GatewayError {
    fn from(e: ConversationError) -> Self {
        match e {
            ConversationError::RecipientNotFound => GatewayError::NotFound(e.to_string()),
            ConversationError::Forbidden => GatewayError::Forbidden(e.to_string()),
            ConversationError::InvalidKey
            | ConversationError::EmptyText
            | ConversationError::TextTooLong => GatewayError::Invalid(e.to_string()),
            ConversationError::Internal(detail) => {
                tracing::error!("Conversation persistence failed: {}", detail);
                GatewayError::Internal
            }
        }
    }
}

/// The gateway: room membership plus persist-then-broadcast relaying.
pub struct Gateway {
    registry: Arc<dyn RoomRegistry>,
    chat: Arc<dyn ChatService>,
    conversations: Arc<dyn ConversationService>,
    heartbeat_interval_ms: u64,
}

impl Gateway {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        chat: Arc<dyn ChatService>,
        conversations: Arc<dyn ConversationService>,
        heartbeat_interval_ms: u64,
    ) -> Self {
        Self {
            registry,
            chat,
            conversations,
            heartbeat_interval_ms,
        }
    }

    /// Get the heartbeat interval
    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Subscribe the connection to a conversation room. The caller must be
    /// a participant of the pair encoded in the key.
    pub async fn join_conversation(
        &self,
        conn: &ConnectionHandle,
        key: &str,
    ) -> Result<String, GatewayError> {
        self.conversations
            .authorize_subscribe(conn.user_id, key)
            .await?;

        let room = dm_room(key);
        self.registry
            .subscribe(&room, &conn.connection_id, conn.sender.clone());
        Ok(room)
    }

    /// Subscribe the connection to a channel room. The caller must be a
    /// member of the channel's community.
    pub async fn join_channel(
        &self,
        conn: &ConnectionHandle,
        channel_id: i64,
    ) -> Result<String, GatewayError> {
        self.chat.authorize_subscribe(channel_id, conn.user_id).await?;

        let room = channel_room(channel_id);
        self.registry
            .subscribe(&room, &conn.connection_id, conn.sender.clone());
        Ok(room)
    }

    /// Unsubscribe the connection from a room; idempotent.
    pub fn leave(&self, conn: &ConnectionHandle, room: &str) {
        self.registry.unsubscribe(room, &conn.connection_id);
    }

    /// Persist a direct message, then fan it out to the room's live
    /// subscribers. A persistence failure aborts the publish.
    pub async fn send_direct_message(
        &self,
        conn: &ConnectionHandle,
        target: DirectMessageTarget,
        content: &str,
    ) -> Result<ConversationMessageDto, GatewayError> {
        let persisted = match target {
            DirectMessageTarget::RoomKey(key) => {
                self.conversations
                    .send_by_key(conn.user_id, &key, content)
                    .await?
            }
            DirectMessageTarget::Recipient(recipient_id) => {
                self.conversations
                    .send_message(conn.user_id, recipient_id, content)
                    .await?
            }
        };
        metrics::record_message_persisted("dm", "gateway");

        let room = dm_room(&persisted.room_key);
        let payload = serde_json::to_value(ConversationMessageResponse::from(persisted.clone()))
            .map_err(|_| GatewayError::Internal)?;
        let delivered = self
            .registry
            .publish(&room, GatewaySend::dispatch(DIRECT_MESSAGE_CREATE, payload));
        metrics::record_message_broadcast("dm");

        tracing::debug!(
            room = %room,
            sender_id = conn.user_id,
            delivered = delivered,
            "Direct message relayed"
        );

        Ok(persisted)
    }

    /// Persist a channel message, then fan it out. The broadcast payload is
    /// enriched with the sender's display identity by the service layer.
    pub async fn send_channel_message(
        &self,
        conn: &ConnectionHandle,
        channel_id: i64,
        content: &str,
        attachments: Vec<String>,
    ) -> Result<ChannelMessageDto, GatewayError> {
        let persisted = self
            .chat
            .send_message(channel_id, conn.user_id, content, attachments)
            .await?;
        metrics::record_message_persisted("channel", "gateway");

        let room = channel_room(channel_id);
        let payload = serde_json::to_value(ChannelMessageResponse::from(persisted.clone()))
            .map_err(|_| GatewayError::Internal)?;
        let delivered = self
            .registry
            .publish(&room, GatewaySend::dispatch(CHANNEL_MESSAGE_CREATE, payload));
        metrics::record_message_broadcast("channel");

        tracing::debug!(
            room = %room,
            sender_id = conn.user_id,
            delivered = delivered,
            "Channel message relayed"
        );

        Ok(persisted)
    }

    /// Best-effort cleanup when a connection drops: the connection leaves
    /// every room it had joined. No persisted state changes.
    pub fn disconnect(&self, connection_id: &str) {
        self.registry.drop_connection(connection_id);
    }

    /// Derive the canonical conversation key for a pair (exposed for the
    /// REST surface and clients).
    pub fn conversation_key(user_a: i64, user_b: i64) -> String {
        room_key(user_a, user_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::websocket::registry::InMemoryRoomRegistry;
    use async_trait::async_trait;

    /// Conversation service stub: authorizes participants of "1_2" and
    /// persists into a counter.
    struct StubConversations {
        fail_persist: bool,
        persisted: std::sync::atomic::AtomicUsize,
    }

    impl StubConversations {
        fn new(fail_persist: bool) -> Self {
            Self {
                fail_persist,
                persisted: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        fn persist_count(&self) -> usize {
            self.persisted.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn make_dto(&self, sender_id: i64, content: &str) -> ConversationMessageDto {
            ConversationMessageDto {
                id: "1".into(),
                room_key: "1_2".into(),
                sender_id: sender_id.to_string(),
                content: content.into(),
                delivered: false,
                seen: false,
                created_at: "2024-01-01T00:00:00Z".into(),
            }
        }
    }

    #[async_trait]
    impl ConversationService for StubConversations {
        async fn send_message(
            &self,
            sender_id: i64,
            _recipient_id: i64,
            content: &str,
        ) -> Result<ConversationMessageDto, ConversationError> {
            if self.fail_persist {
                return Err(ConversationError::Internal("disk full".into()));
            }
            self.persisted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.make_dto(sender_id, content))
        }

        async fn send_by_key(
            &self,
            sender_id: i64,
            key: &str,
            content: &str,
        ) -> Result<ConversationMessageDto, ConversationError> {
            if key != "1_2" {
                return Err(ConversationError::InvalidKey);
            }
            self.send_message(sender_id, 0, content).await
        }

        async fn get_history(
            &self,
            _requester_id: i64,
            _key: &str,
        ) -> Result<Vec<ConversationMessageDto>, ConversationError> {
            Ok(vec![])
        }

        async fn authorize_subscribe(
            &self,
            user_id: i64,
            key: &str,
        ) -> Result<(), ConversationError> {
            if key != "1_2" {
                return Err(ConversationError::InvalidKey);
            }
            if user_id != 1 && user_id != 2 {
                return Err(ConversationError::Forbidden);
            }
            Ok(())
        }
    }

    struct StubChat;

    #[async_trait]
    impl ChatService for StubChat {
        async fn send_message(
            &self,
            channel_id: i64,
            sender_id: i64,
            content: &str,
            attachments: Vec<String>,
        ) -> Result<ChannelMessageDto, ChatError> {
            Ok(ChannelMessageDto {
                id: "1".into(),
                channel_id: channel_id.to_string(),
                sender_id: sender_id.to_string(),
                sender_display_name: Some("Alice".into()),
                content: content.into(),
                attachments,
                created_at: "2024-01-01T00:00:00Z".into(),
            })
        }

        async fn get_history(
            &self,
            _channel_id: i64,
            _requester_id: i64,
            _page: Option<i32>,
            _limit: Option<i32>,
        ) -> Result<Vec<ChannelMessageDto>, ChatError> {
            Ok(vec![])
        }

        async fn authorize_subscribe(&self, _channel_id: i64, user_id: i64) -> Result<(), ChatError> {
            if user_id == 99 {
                return Err(ChatError::Forbidden);
            }
            Ok(())
        }
    }

    fn connection(id: &str, user_id: i64) -> (ConnectionHandle, mpsc::UnboundedReceiver<GatewaySend>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ConnectionHandle {
                connection_id: id.to_string(),
                user_id,
                sender: tx,
            },
            rx,
        )
    }

    fn build_gateway(fail_persist: bool) -> (Gateway, Arc<StubConversations>) {
        let conversations = Arc::new(StubConversations::new(fail_persist));
        let gateway = Gateway::new(
            Arc::new(InMemoryRoomRegistry::new()),
            Arc::new(StubChat),
            conversations.clone(),
            45000,
        );
        (gateway, conversations)
    }

    #[tokio::test]
    async fn test_dm_broadcast_reaches_both_subscribers() {
        let (gateway, _) = build_gateway(false);
        let (alice, mut alice_rx) = connection("conn-a", 1);
        let (bob, mut bob_rx) = connection("conn-b", 2);

        gateway.join_conversation(&alice, "1_2").await.unwrap();
        gateway.join_conversation(&bob, "1_2").await.unwrap();

        gateway
            .send_direct_message(&alice, DirectMessageTarget::RoomKey("1_2".into()), "hi")
            .await
            .unwrap();

        let frame = alice_rx.try_recv().unwrap();
        assert_eq!(frame.t.as_deref(), Some(DIRECT_MESSAGE_CREATE));
        assert!(bob_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_persist_failure_aborts_broadcast() {
        let (gateway, conversations) = build_gateway(true);
        let (alice, _alice_rx) = connection("conn-a", 1);
        let (bob, mut bob_rx) = connection("conn-b", 2);

        gateway.join_conversation(&bob, "1_2").await.unwrap();

        let result = gateway
            .send_direct_message(&alice, DirectMessageTarget::Recipient(2), "hi")
            .await;

        assert!(matches!(result, Err(GatewayError::Internal)));
        assert_eq!(conversations.persist_count(), 0);
        // No partial broadcast on persistence failure
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_requires_participation() {
        let (gateway, _) = build_gateway(false);
        let (eve, _rx) = connection("conn-e", 99);

        assert!(matches!(
            gateway.join_conversation(&eve, "1_2").await,
            Err(GatewayError::Forbidden(_))
        ));
        assert!(matches!(
            gateway.join_channel(&eve, 5).await,
            Err(GatewayError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_double_join_yields_single_delivery() {
        let (gateway, _) = build_gateway(false);
        let (alice, mut alice_rx) = connection("conn-a", 1);

        gateway.join_conversation(&alice, "1_2").await.unwrap();
        gateway.join_conversation(&alice, "1_2").await.unwrap();

        gateway
            .send_direct_message(&alice, DirectMessageTarget::RoomKey("1_2".into()), "once")
            .await
            .unwrap();

        assert!(alice_rx.try_recv().is_ok());
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_broadcast_carries_display_name() {
        let (gateway, _) = build_gateway(false);
        let (alice, mut alice_rx) = connection("conn-a", 1);

        gateway.join_channel(&alice, 5).await.unwrap();
        gateway
            .send_channel_message(&alice, 5, "hello", vec![])
            .await
            .unwrap();

        let frame = alice_rx.try_recv().unwrap();
        assert_eq!(frame.t.as_deref(), Some(CHANNEL_MESSAGE_CREATE));
        let data = frame.d.unwrap();
        assert_eq!(data["sender_display_name"], "Alice");
    }

    #[tokio::test]
    async fn test_leave_and_disconnect_stop_delivery() {
        let (gateway, _) = build_gateway(false);
        let (alice, mut alice_rx) = connection("conn-a", 1);
        let (bob, mut bob_rx) = connection("conn-b", 2);

        let room = gateway.join_conversation(&alice, "1_2").await.unwrap();
        gateway.join_conversation(&bob, "1_2").await.unwrap();

        gateway.leave(&alice, &room);
        gateway.disconnect(&bob.connection_id);

        gateway
            .send_direct_message(&alice, DirectMessageTarget::RoomKey("1_2".into()), "hi")
            .await
            .unwrap();

        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_err());
    }
}

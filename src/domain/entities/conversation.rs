//! Conversation (direct-message room) entities and repository trait.
//!
//! Maps to the `conversations` and `conversation_messages` tables. A
//! conversation is keyed by a deterministic pair key so either participant
//! computes the same key independently; it is created lazily on first
//! message and never deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Derive the room key for a participant pair.
///
/// The two ids are rendered as decimal strings, ordered lexicographically,
/// and joined by `_`. The key is a pure function of the unordered pair:
/// `room_key(a, b) == room_key(b, a)`.
pub fn room_key(user_a: i64, user_b: i64) -> String {
    let a = user_a.to_string();
    let b = user_b.to_string();
    if a <= b {
        format!("{}_{}", a, b)
    } else {
        format!("{}_{}", b, a)
    }
}

/// Parse a room key back into its participant pair.
///
/// Returns None unless the key is exactly two decimal ids joined by `_`
/// in canonical (lexicographic) order.
pub fn parse_room_key(key: &str) -> Option<(i64, i64)> {
    let (a, b) = key.split_once('_')?;
    let first: i64 = a.parse().ok()?;
    let second: i64 = b.parse().ok()?;
    if room_key(first, second) != key {
        return None;
    }
    Some((first, second))
}

/// A direct-message room between two users.
///
/// Maps to the `conversations` table:
/// - room_key: VARCHAR(64) PRIMARY KEY -- derived pair key
/// - user_a: BIGINT NOT NULL REFERENCES users(id)
/// - user_b: BIGINT NOT NULL REFERENCES users(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub room_key: String,
    pub user_a: i64,
    pub user_b: i64,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Check whether a user is one of the two participants.
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }
}

/// A message inside a conversation. Append-only and immutable.
///
/// Maps to the `conversation_messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - room_key: VARCHAR(64) NOT NULL REFERENCES conversations(room_key)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - content: TEXT NOT NULL (non-empty after trim)
/// - delivered: BOOLEAN NOT NULL DEFAULT FALSE
/// - seen: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub room_key: String,
    pub sender_id: i64,
    pub content: String,
    pub delivered: bool,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for Conversation data access operations.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Find a conversation by its room key.
    async fn find_by_key(&self, room_key: &str) -> Result<Option<Conversation>, AppError>;

    /// Upsert the room (create on first message, seeding the participant
    /// pair) and append the message in one atomic step.
    async fn append_message(
        &self,
        conversation: &Conversation,
        message: &ConversationMessage,
    ) -> Result<ConversationMessage, AppError>;

    /// Full message history for a room, in chronological order.
    async fn find_messages(&self, room_key: &str) -> Result<Vec<ConversationMessage>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key_symmetric() {
        assert_eq!(room_key(42, 7), room_key(7, 42));
        assert_eq!(room_key(1, 1), "1_1");
    }

    #[test]
    fn test_room_key_orders_lexicographically() {
        // "13" sorts before "7" as a string
        assert_eq!(room_key(7, 13), "13_7");
        assert_eq!(room_key(13, 7), "13_7");
    }

    #[test]
    fn test_parse_room_key_roundtrip() {
        let key = room_key(9001, 42);
        let (a, b) = parse_room_key(&key).unwrap();
        assert_eq!(room_key(a, b), key);
    }

    #[test]
    fn test_parse_room_key_rejects_non_canonical() {
        // "7_13" is the wrong order under lexicographic comparison
        assert!(parse_room_key("7_13").is_none());
        assert!(parse_room_key("abc_def").is_none());
        assert!(parse_room_key("42").is_none());
        assert!(parse_room_key("").is_none());
    }

    #[test]
    fn test_has_participant() {
        let conversation = Conversation {
            room_key: room_key(1, 2),
            user_a: 1,
            user_b: 2,
            created_at: Utc::now(),
        };
        assert!(conversation.has_participant(1));
        assert!(conversation.has_participant(2));
        assert!(!conversation.has_participant(3));
    }
}

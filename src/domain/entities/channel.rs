//! Channel entity and repository trait.
//!
//! Maps to the `channels` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Channel kinds matching the `channel_kind` VARCHAR constraint.
///
/// Text channels accept messages; voice channels do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// A text channel within a community
    #[default]
    Text,
    /// A voice channel within a community
    Voice,
}

impl ChannelKind {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "voice" => Self::Voice,
            _ => Self::Text,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize a channel name to its stored slug form: lowercased, with
/// whitespace runs collapsed to single hyphens. `"General Chat"` becomes
/// `"general-chat"`.
pub fn slugify_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Represents a channel inside a community.
///
/// Maps to the `channels` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - community_id: BIGINT NOT NULL REFERENCES communities(id)
/// - name: VARCHAR(100) NOT NULL -- slug form, unique per community
/// - kind: VARCHAR(10) NOT NULL DEFAULT 'text'
/// - topic: TEXT NULL
/// - position: INTEGER NOT NULL DEFAULT 0
/// - parent_id: BIGINT REFERENCES channels(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Owning community
    pub community_id: i64,

    /// Channel name in slug form (unique within the community)
    pub name: String,

    /// Channel kind
    #[serde(rename = "kind")]
    pub kind: ChannelKind,

    /// Channel topic/description
    pub topic: Option<String>,

    /// Sorting position within the community
    pub position: i32,

    /// Parent channel ID (for grouping)
    pub parent_id: Option<i64>,

    /// Channel creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Check if this channel accepts messages.
    pub fn accepts_messages(&self) -> bool {
        matches!(self.kind, ChannelKind::Text)
    }
}

/// Repository trait for Channel data access operations.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Find a channel by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError>;

    /// Find all channels in a community, ordered by position.
    async fn find_by_community(&self, community_id: i64) -> Result<Vec<Channel>, AppError>;

    /// Check whether a slug name is already used within a community.
    async fn name_exists(&self, community_id: i64, name: &str) -> Result<bool, AppError>;

    /// Create a new channel.
    async fn create(&self, channel: &Channel) -> Result<Channel, AppError>;

    /// Update an existing channel.
    async fn update(&self, channel: &Channel) -> Result<Channel, AppError>;

    /// Delete a channel.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify_name("General Chat"), "general-chat");
    }

    #[test]
    fn test_slugify_collapses_whitespace_runs() {
        assert_eq!(slugify_name("  dev   talk \t here "), "dev-talk-here");
    }

    #[test]
    fn test_slugify_keeps_existing_hyphens() {
        assert_eq!(slugify_name("off-topic"), "off-topic");
    }

    #[test]
    fn test_kind_from_str_unknown_defaults_to_text() {
        assert_eq!(ChannelKind::from_str("text"), ChannelKind::Text);
        assert_eq!(ChannelKind::from_str("VOICE"), ChannelKind::Voice);
        assert_eq!(ChannelKind::from_str("category"), ChannelKind::Text);
    }

    #[test]
    fn test_voice_channels_reject_messages() {
        let channel = Channel {
            id: 1,
            community_id: 10,
            name: "lounge".into(),
            kind: ChannelKind::Voice,
            topic: None,
            position: 0,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!channel.accepts_messages());
    }
}

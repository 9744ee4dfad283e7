//! Community and membership entities with their repository traits.
//!
//! Maps to the `communities` and `community_members` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A community: a Discord-like server containing channels and members.
///
/// Maps to the `communities` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(100) NOT NULL
/// - owner_id: BIGINT NOT NULL REFERENCES users(id)
/// - description: TEXT NULL
/// - icon_url: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member roles, ordered by privilege. Owner outranks admin outranks
/// moderator outranks member.
///
/// Matches the `member_role` VARCHAR constraint in `community_members`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Moderator,
    #[default]
    Member,
}

impl MemberRole {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "owner" => Self::Owner,
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            _ => Self::Member,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }

    /// Numeric privilege rank; higher outranks lower.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Moderator => 1,
            Self::Member => 0,
        }
    }

    /// Whether this role may create, update, or delete channels.
    pub fn can_manage_channels(&self) -> bool {
        self.rank() >= Self::Admin.rank()
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's membership in a community. Unique per (user, community).
///
/// Maps to the `community_members` table (composite primary key):
/// - community_id: BIGINT NOT NULL REFERENCES communities(id)
/// - user_id: BIGINT NOT NULL REFERENCES users(id)
/// - role: VARCHAR(20) NOT NULL DEFAULT 'member'
/// - joined_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub community_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Create a plain member record.
    pub fn new(community_id: i64, user_id: i64) -> Self {
        Self {
            community_id,
            user_id,
            role: MemberRole::Member,
            joined_at: Utc::now(),
        }
    }
}

/// Repository trait for Community data access operations.
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Find a community by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Community>, AppError>;

    /// Create a new community.
    async fn create(&self, community: &Community) -> Result<Community, AppError>;

    /// Communities a user belongs to.
    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Community>, AppError>;
}

/// Repository trait for Membership data access operations.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Find a membership by community and user ID.
    async fn find(&self, community_id: i64, user_id: i64) -> Result<Option<Membership>, AppError>;

    /// Add a member. Fails with a conflict if the membership exists.
    async fn create(&self, membership: &Membership) -> Result<Membership, AppError>;

    /// Remove a member; idempotent.
    async fn delete(&self, community_id: i64, user_id: i64) -> Result<(), AppError>;

    /// Check if a user is a member of a community.
    async fn is_member(&self, community_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Member count for a community.
    async fn count_by_community(&self, community_id: i64) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(MemberRole::Owner.rank() > MemberRole::Admin.rank());
        assert!(MemberRole::Admin.rank() > MemberRole::Moderator.rank());
        assert!(MemberRole::Moderator.rank() > MemberRole::Member.rank());
    }

    #[test]
    fn test_channel_management_requires_admin() {
        assert!(MemberRole::Owner.can_manage_channels());
        assert!(MemberRole::Admin.can_manage_channels());
        assert!(!MemberRole::Moderator.can_manage_channels());
        assert!(!MemberRole::Member.can_manage_channels());
    }

    #[test]
    fn test_role_from_str_unknown_defaults_to_member() {
        assert_eq!(MemberRole::from_str("owner"), MemberRole::Owner);
        assert_eq!(MemberRole::from_str("ADMIN"), MemberRole::Admin);
        assert_eq!(MemberRole::from_str("unknown"), MemberRole::Member);
        assert_eq!(MemberRole::from_str(""), MemberRole::Member);
    }

    #[test]
    fn test_role_as_str_roundtrip() {
        for role in [
            MemberRole::Owner,
            MemberRole::Admin,
            MemberRole::Moderator,
            MemberRole::Member,
        ] {
            assert_eq!(MemberRole::from_str(role.as_str()), role);
        }
    }
}

//! Community Service
//!
//! Handles community creation, membership, and channel management.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    slugify_name, Channel, ChannelKind, ChannelRepository, Community, CommunityRepository,
    MemberRole, Membership, MembershipRepository,
};
use crate::shared::snowflake::SnowflakeGenerator;

/// Community service trait
#[async_trait]
pub trait CommunityService: Send + Sync {
    /// Create a community; the creator becomes its owner member
    async fn create_community(
        &self,
        owner_id: i64,
        request: CreateCommunityDto,
    ) -> Result<CommunityDto, CommunityError>;

    /// Get a community by ID
    async fn get_community(&self, community_id: i64) -> Result<CommunityDto, CommunityError>;

    /// Communities the user belongs to
    async fn my_communities(&self, user_id: i64) -> Result<Vec<CommunityDto>, CommunityError>;

    /// Join a community as a plain member
    async fn join(&self, community_id: i64, user_id: i64) -> Result<(), CommunityError>;

    /// Leave a community. The owner cannot leave their own community.
    async fn leave(&self, community_id: i64, user_id: i64) -> Result<(), CommunityError>;

    /// List channels of a community (members only)
    async fn get_channels(
        &self,
        community_id: i64,
        requester_id: i64,
    ) -> Result<Vec<ChannelDto>, CommunityError>;

    /// Create a channel (owner/admin only); the name is slug-normalized
    async fn create_channel(
        &self,
        community_id: i64,
        actor_id: i64,
        request: CreateChannelDto,
    ) -> Result<ChannelDto, CommunityError>;

    /// Get a channel (members of its community only)
    async fn get_channel(&self, channel_id: i64, requester_id: i64) -> Result<ChannelDto, CommunityError>;

    /// Update a channel (owner/admin only)
    async fn update_channel(
        &self,
        channel_id: i64,
        actor_id: i64,
        update: UpdateChannelDto,
    ) -> Result<ChannelDto, CommunityError>;

    /// Delete a channel (owner/admin only)
    async fn delete_channel(&self, channel_id: i64, actor_id: i64) -> Result<(), CommunityError>;
}

/// Create community request
#[derive(Debug, Clone)]
pub struct CreateCommunityDto {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

/// Community data transfer object
#[derive(Debug, Clone)]
pub struct CommunityDto {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub member_count: i64,
    pub created_at: String,
}

/// Create channel request
#[derive(Debug, Clone)]
pub struct CreateChannelDto {
    pub name: String,
    pub kind: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<i64>,
}

/// Channel data transfer object
#[derive(Debug, Clone)]
pub struct ChannelDto {
    pub id: String,
    pub community_id: String,
    pub name: String,
    pub kind: String,
    pub topic: Option<String>,
    pub position: i32,
    pub parent_id: Option<String>,
    pub created_at: String,
}

impl From<Channel> for ChannelDto {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id.to_string(),
            community_id: channel.community_id.to_string(),
            name: channel.name,
            kind: channel.kind.as_str().to_string(),
            topic: channel.topic,
            position: channel.position,
            parent_id: channel.parent_id.map(|id| id.to_string()),
            created_at: channel.created_at.to_rfc3339(),
        }
    }
}

/// Update channel request
#[derive(Debug, Clone, Default)]
pub struct UpdateChannelDto {
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<Option<i64>>,
}

/// Community service errors
#[derive(Debug, thiserror::Error)]
pub enum CommunityError {
    #[error("Community not found")]
    NotFound,

    #[error("Channel not found")]
    ChannelNotFound,

    #[error("Permission denied")]
    Forbidden,

    #[error("Already a member")]
    AlreadyMember,

    #[error("Channel name already in use")]
    DuplicateChannelName,

    #[error("Channel name must not be empty")]
    EmptyChannelName,

    #[error("The owner cannot leave their community")]
    OwnerCannotLeave,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// CommunityService implementation
pub struct CommunityServiceImpl<C, M, Ch>
where
    C: CommunityRepository,
    M: MembershipRepository,
    Ch: ChannelRepository,
{
    community_repo: Arc<C>,
    membership_repo: Arc<M>,
    channel_repo: Arc<Ch>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, M, Ch> CommunityServiceImpl<C, M, Ch>
where
    C: CommunityRepository,
    M: MembershipRepository,
    Ch: ChannelRepository,
{
    pub fn new(
        community_repo: Arc<C>,
        membership_repo: Arc<M>,
        channel_repo: Arc<Ch>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            community_repo,
            membership_repo,
            channel_repo,
            id_generator,
        }
    }

    async fn to_dto(&self, community: Community) -> Result<CommunityDto, CommunityError> {
        let member_count = self
            .membership_repo
            .count_by_community(community.id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(CommunityDto {
            id: community.id.to_string(),
            name: community.name,
            owner_id: community.owner_id.to_string(),
            description: community.description,
            icon_url: community.icon_url,
            member_count,
            created_at: community.created_at.to_rfc3339(),
        })
    }

    /// Resolve the actor's role; community must exist first.
    async fn require_manage_role(
        &self,
        community_id: i64,
        actor_id: i64,
    ) -> Result<(), CommunityError> {
        let membership = self
            .membership_repo
            .find(community_id, actor_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::Forbidden)?;

        if !membership.role.can_manage_channels() {
            return Err(CommunityError::Forbidden);
        }
        Ok(())
    }
}

#[async_trait]
impl<C, M, Ch> CommunityService for CommunityServiceImpl<C, M, Ch>
where
    C: CommunityRepository + 'static,
    M: MembershipRepository + 'static,
    Ch: ChannelRepository + 'static,
{
    async fn create_community(
        &self,
        owner_id: i64,
        request: CreateCommunityDto,
    ) -> Result<CommunityDto, CommunityError> {
        let now = Utc::now();
        let community = Community {
            id: self.id_generator.generate(),
            name: request.name,
            owner_id,
            description: request.description,
            icon_url: request.icon_url,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .community_repo
            .create(&community)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        let owner_membership = Membership {
            community_id: created.id,
            user_id: owner_id,
            role: MemberRole::Owner,
            joined_at: now,
        };
        self.membership_repo
            .create(&owner_membership)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        self.to_dto(created).await
    }

    async fn get_community(&self, community_id: i64) -> Result<CommunityDto, CommunityError> {
        let community = self
            .community_repo
            .find_by_id(community_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::NotFound)?;

        self.to_dto(community).await
    }

    async fn my_communities(&self, user_id: i64) -> Result<Vec<CommunityDto>, CommunityError> {
        let communities = self
            .community_repo
            .find_by_member(user_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        let mut dtos = Vec::with_capacity(communities.len());
        for community in communities {
            dtos.push(self.to_dto(community).await?);
        }
        Ok(dtos)
    }

    async fn join(&self, community_id: i64, user_id: i64) -> Result<(), CommunityError> {
        self.community_repo
            .find_by_id(community_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::NotFound)?;

        let already = self
            .membership_repo
            .is_member(community_id, user_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;
        if already {
            return Err(CommunityError::AlreadyMember);
        }

        self.membership_repo
            .create(&Membership::new(community_id, user_id))
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(())
    }

    async fn leave(&self, community_id: i64, user_id: i64) -> Result<(), CommunityError> {
        let community = self
            .community_repo
            .find_by_id(community_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::NotFound)?;

        if community.owner_id == user_id {
            return Err(CommunityError::OwnerCannotLeave);
        }

        self.membership_repo
            .delete(community_id, user_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(())
    }

    async fn get_channels(
        &self,
        community_id: i64,
        requester_id: i64,
    ) -> Result<Vec<ChannelDto>, CommunityError> {
        self.community_repo
            .find_by_id(community_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::NotFound)?;

        let is_member = self
            .membership_repo
            .is_member(community_id, requester_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;
        if !is_member {
            return Err(CommunityError::Forbidden);
        }

        let channels = self
            .channel_repo
            .find_by_community(community_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(channels.into_iter().map(ChannelDto::from).collect())
    }

    async fn create_channel(
        &self,
        community_id: i64,
        actor_id: i64,
        request: CreateChannelDto,
    ) -> Result<ChannelDto, CommunityError> {
        self.community_repo
            .find_by_id(community_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::NotFound)?;

        self.require_manage_role(community_id, actor_id).await?;

        let name = slugify_name(&request.name);
        if name.is_empty() {
            return Err(CommunityError::EmptyChannelName);
        }

        let taken = self
            .channel_repo
            .name_exists(community_id, &name)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;
        if taken {
            return Err(CommunityError::DuplicateChannelName);
        }

        let now = Utc::now();
        let channel = Channel {
            id: self.id_generator.generate(),
            community_id,
            name,
            kind: request
                .kind
                .as_deref()
                .map(ChannelKind::from_str)
                .unwrap_or_default(),
            topic: request.topic,
            position: request.position.unwrap_or(0),
            parent_id: request.parent_id,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .channel_repo
            .create(&channel)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(ChannelDto::from(created))
    }

    async fn get_channel(
        &self,
        channel_id: i64,
        requester_id: i64,
    ) -> Result<ChannelDto, CommunityError> {
        let channel = self
            .channel_repo
            .find_by_id(channel_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::ChannelNotFound)?;

        let is_member = self
            .membership_repo
            .is_member(channel.community_id, requester_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;
        if !is_member {
            return Err(CommunityError::Forbidden);
        }

        Ok(ChannelDto::from(channel))
    }

    async fn update_channel(
        &self,
        channel_id: i64,
        actor_id: i64,
        update: UpdateChannelDto,
    ) -> Result<ChannelDto, CommunityError> {
        let mut channel = self
            .channel_repo
            .find_by_id(channel_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::ChannelNotFound)?;

        self.require_manage_role(channel.community_id, actor_id).await?;

        if let Some(name) = update.name {
            let slug = slugify_name(&name);
            if slug.is_empty() {
                return Err(CommunityError::EmptyChannelName);
            }
            if slug != channel.name {
                let taken = self
                    .channel_repo
                    .name_exists(channel.community_id, &slug)
                    .await
                    .map_err(|e| CommunityError::Internal(e.to_string()))?;
                if taken {
                    return Err(CommunityError::DuplicateChannelName);
                }
                channel.name = slug;
            }
        }
        if let Some(topic) = update.topic {
            channel.topic = Some(topic);
        }
        if let Some(position) = update.position {
            channel.position = position;
        }
        if let Some(parent_id) = update.parent_id {
            channel.parent_id = parent_id;
        }

        let updated = self
            .channel_repo
            .update(&channel)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(ChannelDto::from(updated))
    }

    async fn delete_channel(&self, channel_id: i64, actor_id: i64) -> Result<(), CommunityError> {
        let channel = self
            .channel_repo
            .find_by_id(channel_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?
            .ok_or(CommunityError::ChannelNotFound)?;

        self.require_manage_role(channel.community_id, actor_id).await?;

        self.channel_repo
            .delete(channel_id)
            .await
            .map_err(|e| CommunityError::Internal(e.to_string()))?;

        Ok(())
    }
}

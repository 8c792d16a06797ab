use std::sync::Arc;

use bson::oid::ObjectId;
use gatehouse_db::models::{Group, GroupMember, ResourcePermission};
use tracing::info;

use super::authorizer::Authorizer;
use crate::auth::Session;
use crate::error::{AccessError, AccessResult, Entity, ForbiddenReason};
use crate::store::{GroupStore, MemberStore, Stores};

const MAX_GROUP_NAME_LEN: usize = 100;

/// Owner-only administration of groups and their resource grants.
pub struct GroupAdminService {
    authorizer: Authorizer,
    groups: Arc<dyn GroupStore>,
    members: Arc<dyn MemberStore>,
}

impl GroupAdminService {
    pub fn new(authorizer: Authorizer, stores: &Stores) -> Self {
        Self {
            authorizer,
            groups: stores.groups.clone(),
            members: stores.members.clone(),
        }
    }

    pub async fn create_group(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        name: &str,
        description: Option<String>,
    ) -> AccessResult<Group> {
        self.authorizer
            .require_owner(session, organization_id)
            .await?;

        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_GROUP_NAME_LEN {
            return Err(AccessError::InvalidInput("name"));
        }
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let group = self
            .groups
            .insert_group(organization_id, name.to_string(), description)
            .await?;
        info!(%organization_id, group = name, "Group created");
        Ok(group)
    }

    /// Adds a member of the same organization to the group.
    pub async fn add_member(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<GroupMember> {
        self.owned_group(session, organization_id, group_id).await?;
        self.members
            .find_member(organization_id, user_id)
            .await?
            .ok_or(AccessError::Forbidden(ForbiddenReason::CrossTenant))?;

        Ok(self
            .groups
            .add_group_member(organization_id, group_id, user_id)
            .await?)
    }

    /// Grants the group visibility of `resource_id`. The resource does not
    /// have to be synced yet.
    pub async fn grant(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        group_id: ObjectId,
        resource_id: &str,
    ) -> AccessResult<ResourcePermission> {
        self.owned_group(session, organization_id, group_id).await?;
        let resource_id = resource_id.trim();
        if resource_id.is_empty() {
            return Err(AccessError::InvalidInput("resource_id"));
        }

        let permission = self
            .groups
            .grant(organization_id, group_id, resource_id.to_string())
            .await?;
        info!(%organization_id, %group_id, resource_id, "Permission granted");
        Ok(permission)
    }

    pub async fn revoke(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        group_id: ObjectId,
        resource_id: &str,
    ) -> AccessResult<()> {
        self.owned_group(session, organization_id, group_id).await?;
        if !self.groups.revoke(group_id, resource_id).await? {
            return Err(AccessError::NotFound(Entity::Permission));
        }
        info!(%organization_id, %group_id, resource_id, "Permission revoked");
        Ok(())
    }

    async fn owned_group(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        group_id: ObjectId,
    ) -> AccessResult<Group> {
        self.authorizer
            .require_owner(session, organization_id)
            .await?;
        self.groups
            .find_group(organization_id, group_id)
            .await?
            .ok_or(AccessError::NotFound(Entity::Group))
    }
}

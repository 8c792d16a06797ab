use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use gatehouse_db::models::{Group, GroupMember, ResourcePermission};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::GroupStore;

pub struct GroupDao {
    pub base: BaseDao<Group>,
    pub members: BaseDao<GroupMember>,
    pub permissions: BaseDao<ResourcePermission>,
}

impl GroupDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Group::COLLECTION),
            members: BaseDao::new(db, GroupMember::COLLECTION),
            permissions: BaseDao::new(db, ResourcePermission::COLLECTION),
        }
    }
}

#[async_trait]
impl GroupStore for GroupDao {
    async fn insert_group(
        &self,
        organization_id: ObjectId,
        name: String,
        description: Option<String>,
    ) -> DaoResult<Group> {
        let now = DateTime::now();
        let group = Group {
            id: None,
            organization_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&group).await?;
        self.base.find_by_id(id).await
    }

    async fn find_group(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
    ) -> DaoResult<Option<Group>> {
        self.base
            .find_one(doc! { "_id": group_id, "organization_id": organization_id })
            .await
    }

    async fn add_group_member(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<GroupMember> {
        let member = GroupMember {
            id: None,
            group_id,
            organization_id,
            user_id,
            created_at: DateTime::now(),
        };

        let id = self.members.insert_one(&member).await?;
        self.members.find_by_id(id).await
    }

    async fn find_user_group_ids(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Vec<ObjectId>> {
        let rows = self
            .members
            .find_many(
                doc! { "organization_id": organization_id, "user_id": user_id },
                None,
                None,
            )
            .await?;
        Ok(rows.into_iter().map(|m| m.group_id).collect())
    }

    async fn grant(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
        resource_id: String,
    ) -> DaoResult<ResourcePermission> {
        let permission = ResourcePermission {
            id: None,
            group_id,
            organization_id,
            resource_id,
            created_at: DateTime::now(),
        };

        let id = self.permissions.insert_one(&permission).await?;
        self.permissions.find_by_id(id).await
    }

    async fn revoke(&self, group_id: ObjectId, resource_id: &str) -> DaoResult<bool> {
        let deleted = self
            .permissions
            .hard_delete(doc! { "group_id": group_id, "resource_id": resource_id })
            .await?;
        Ok(deleted > 0)
    }

    async fn find_granted_resource_ids(&self, group_ids: &[ObjectId]) -> DaoResult<Vec<String>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .permissions
            .find_many(doc! { "group_id": { "$in": group_ids.to_vec() } }, None, None)
            .await?;
        Ok(rows.into_iter().map(|p| p.resource_id).collect())
    }
}

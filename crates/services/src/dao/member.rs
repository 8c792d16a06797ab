use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use gatehouse_db::models::{Member, MemberRole};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::MemberStore;

pub struct MemberDao {
    pub base: BaseDao<Member>,
}

impl MemberDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Member::COLLECTION),
        }
    }
}

#[async_trait]
impl MemberStore for MemberDao {
    async fn insert_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<Member> {
        let now = DateTime::now();
        let member = Member {
            id: None,
            organization_id,
            user_id,
            role,
            joined_at: now,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&member).await?;
        self.base.find_by_id(id).await
    }

    async fn find_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<Member>> {
        self.base
            .find_one(doc! { "organization_id": organization_id, "user_id": user_id })
            .await
    }

    async fn find_memberships(&self, user_id: ObjectId) -> DaoResult<Vec<Member>> {
        self.base
            .find_many(doc! { "user_id": user_id }, Some(doc! { "joined_at": 1 }), None)
            .await
    }

    async fn update_role(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "organization_id": organization_id, "user_id": user_id },
                doc! { "$set": { "role": role.as_str() } },
            )
            .await
    }
}

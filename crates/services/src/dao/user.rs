use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use gatehouse_db::models::{Credential, GroupMember, Member, User};
use mongodb::{Collection, Database};
use tracing::info;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::auth::hash_password;
use crate::store::IdentityBackend;

/// MongoDB-backed identity backend. Deleting a user cascades to the rows
/// that hang off the user id.
pub struct UserDao {
    pub base: BaseDao<User>,
    members: Collection<Document>,
    group_members: Collection<Document>,
    credentials: Collection<Document>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
            members: db.collection(Member::COLLECTION),
            group_members: db.collection(GroupMember::COLLECTION),
            credentials: db.collection(Credential::COLLECTION),
        }
    }
}

#[async_trait]
impl IdentityBackend for UserDao {
    async fn create_identity(&self, email: String, display_name: String) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            display_name,
            password_hash: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    async fn find_identity(&self, user_id: ObjectId) -> DaoResult<Option<User>> {
        self.base.find_one(doc! { "_id": user_id }).await
    }

    async fn delete_identity(&self, user_id: ObjectId) -> DaoResult<()> {
        if self.base.count(doc! { "_id": user_id }).await? == 0 {
            return Err(DaoError::NotFound);
        }

        let filter = doc! { "user_id": user_id };
        let members = self.members.delete_many(filter.clone()).await?.deleted_count;
        let groups = self.group_members.delete_many(filter.clone()).await?.deleted_count;
        let credentials = self.credentials.delete_many(filter).await?.deleted_count;
        self.base.hard_delete(doc! { "_id": user_id }).await?;

        info!(%user_id, members, groups, credentials, "Deleted identity");
        Ok(())
    }

    async fn set_password(&self, user_id: ObjectId, new_password: &str) -> DaoResult<()> {
        let password_hash =
            hash_password(new_password).map_err(|e| DaoError::PasswordHash(e.to_string()))?;

        let matched = self
            .base
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "password_hash": password_hash } },
            )
            .await?;

        if matched { Ok(()) } else { Err(DaoError::NotFound) }
    }
}

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use gatehouse_db::models::Organization;
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::OrganizationStore;

pub struct OrganizationDao {
    pub base: BaseDao<Organization>,
}

impl OrganizationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Organization::COLLECTION),
        }
    }
}

#[async_trait]
impl OrganizationStore for OrganizationDao {
    async fn insert_organization(&self, name: String, slug: String) -> DaoResult<Organization> {
        let now = DateTime::now();
        let organization = Organization {
            id: None,
            name,
            slug,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&organization).await?;
        self.base.find_by_id(id).await
    }

    async fn find_organization(&self, id: ObjectId) -> DaoResult<Option<Organization>> {
        self.base.find_one(bson::doc! { "_id": id }).await
    }
}

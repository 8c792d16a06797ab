use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use gatehouse_db::models::Integration;
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::store::IntegrationStore;

pub struct IntegrationDao {
    pub base: BaseDao<Integration>,
}

impl IntegrationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Integration::COLLECTION),
        }
    }
}

#[async_trait]
impl IntegrationStore for IntegrationDao {
    async fn insert_integration(&self, integration: Integration) -> DaoResult<Integration> {
        let id = self.base.insert_one(&integration).await?;
        self.base.find_by_id(id).await
    }

    async fn find_integration(&self, id: ObjectId) -> DaoResult<Option<Integration>> {
        self.base.find_one(doc! { "_id": id }).await
    }

    async fn list_integrations(&self, organization_id: ObjectId) -> DaoResult<Vec<Integration>> {
        self.base
            .find_many(
                doc! { "organization_id": organization_id },
                Some(doc! { "name": 1 }),
                None,
            )
            .await
    }

    async fn touch_last_synced(&self, id: ObjectId, at: DateTime) -> DaoResult<bool> {
        self.base
            .update_one(doc! { "_id": id }, doc! { "$set": { "last_synced_at": at } })
            .await
    }

    async fn delete_integration(&self, id: ObjectId) -> DaoResult<bool> {
        Ok(self.base.hard_delete(doc! { "_id": id }).await? > 0)
    }
}

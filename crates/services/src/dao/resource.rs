use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use gatehouse_db::models::{Resource, ResourceKind, ResourceStatus};
use mongodb::Database;
use tracing::{debug, warn};

use super::base::{map_write_error, BaseDao, DaoResult};
use crate::store::ResourceStore;

pub struct ResourceDao {
    pub base: BaseDao<Resource>,
}

impl ResourceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Resource::COLLECTION),
        }
    }
}

#[async_trait]
impl ResourceStore for ResourceDao {
    async fn find_active_by_resource_ids(
        &self,
        organization_id: ObjectId,
        resource_ids: &[String],
        limit: usize,
    ) -> DaoResult<Vec<Resource>> {
        if resource_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let status = bson::to_bson(&ResourceStatus::Active)?;
        self.base
            .find_many(
                doc! {
                    "organization_id": organization_id,
                    "resource_id": { "$in": resource_ids.to_vec() },
                    "status": status,
                },
                Some(doc! { "resource_id": 1, "_id": 1 }),
                Some(limit as i64),
            )
            .await
    }

    async fn replace_resources(
        &self,
        integration_id: ObjectId,
        kind: ResourceKind,
        generation: ObjectId,
        rows: Vec<Resource>,
    ) -> DaoResult<u64> {
        let inserted = rows.len() as u64;

        if !rows.is_empty() {
            if let Err(e) = self.base.collection().insert_many(&rows).await {
                // Drop whatever part of the new generation landed; the old one stays.
                if let Err(cleanup) = self
                    .base
                    .hard_delete(doc! {
                        "integration_id": integration_id,
                        "sync_generation": generation,
                    })
                    .await
                {
                    warn!(%integration_id, error = %cleanup, "Failed to remove partial sync generation");
                }
                return Err(map_write_error(e));
            }
        }

        let removed = self
            .base
            .hard_delete(doc! {
                "integration_id": integration_id,
                "kind": kind.as_str(),
                "sync_generation": { "$ne": generation },
            })
            .await?;

        debug!(%integration_id, kind = kind.as_str(), inserted, removed, "Swapped resource generation");
        Ok(inserted)
    }

    async fn count_resources(
        &self,
        integration_id: ObjectId,
        kind: ResourceKind,
    ) -> DaoResult<u64> {
        self.base
            .count(doc! { "integration_id": integration_id, "kind": kind.as_str() })
            .await
    }

    async fn delete_integration_resources(&self, integration_id: ObjectId) -> DaoResult<u64> {
        self.base
            .hard_delete(doc! { "integration_id": integration_id })
            .await
    }
}

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use gatehouse_db::models::{Credential, TokenSet};
use mongodb::{options::ReturnDocument, Database};
use tracing::debug;

use super::base::{map_write_error, BaseDao, DaoError, DaoResult};
use crate::store::CredentialStore;

pub struct CredentialDao {
    pub base: BaseDao<Credential>,
}

impl CredentialDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Credential::COLLECTION),
        }
    }

    fn token_update(tokens: &TokenSet, now: DateTime) -> Document {
        doc! {
            "$set": {
                "access_token": &tokens.access_token,
                "refresh_token": tokens.refresh_token.clone(),
                "expires_at": tokens.expires_at,
                "scope": tokens.scope.clone(),
                "updated_at": now,
            },
            "$inc": { "version": 1_i64 },
        }
    }
}

#[async_trait]
impl CredentialStore for CredentialDao {
    async fn find_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
    ) -> DaoResult<Option<Credential>> {
        self.base
            .find_one(doc! { "user_id": user_id, "integration_id": integration_id })
            .await
    }

    async fn upsert_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
        tokens: &TokenSet,
    ) -> DaoResult<Credential> {
        let now = DateTime::now();
        let mut update = Self::token_update(tokens, now);
        update.insert("$setOnInsert", doc! { "created_at": now });

        let stored = self
            .base
            .collection()
            .find_one_and_update(
                doc! { "user_id": user_id, "integration_id": integration_id },
                update,
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)?
            .ok_or(DaoError::NotFound)?;

        debug!(%user_id, %integration_id, version = stored.version, "Upserted credential");
        Ok(stored)
    }

    async fn replace_if_version(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
        expected_version: i64,
        tokens: &TokenSet,
    ) -> DaoResult<Credential> {
        let stored = self
            .base
            .collection()
            .find_one_and_update(
                doc! {
                    "user_id": user_id,
                    "integration_id": integration_id,
                    "version": expected_version,
                },
                Self::token_update(tokens, DateTime::now()),
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(DaoError::Conflict)?;

        debug!(%user_id, %integration_id, version = stored.version, "Replaced credential");
        Ok(stored)
    }

    async fn delete_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
    ) -> DaoResult<bool> {
        let deleted = self
            .base
            .hard_delete(doc! { "user_id": user_id, "integration_id": integration_id })
            .await?;
        Ok(deleted > 0)
    }

    async fn delete_integration_credentials(&self, integration_id: ObjectId) -> DaoResult<u64> {
        self.base
            .hard_delete(doc! { "integration_id": integration_id })
            .await
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use gatehouse_config::SyncSettings;
use gatehouse_db::models::{Integration, Resource, ResourceKind, ResourceStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::credential::CredentialService;
use crate::error::{AccessError, AccessResult, Entity};
use crate::providers::{ProviderItem, provider_for};
use crate::store::{IntegrationStore, ResourceStore, Stores};

/// Name given to synced items the provider returned without a title.
pub const UNTITLED: &str = "Untitled";

/// Replaces the stored resource set of an integration with a fresh listing.
pub struct Reconciler {
    resources: Arc<dyn ResourceStore>,
    integrations: Arc<dyn IntegrationStore>,
}

impl Reconciler {
    pub fn new(stores: &Stores) -> Self {
        Self {
            resources: stores.resources.clone(),
            integrations: stores.integrations.clone(),
        }
    }

    /// Stores the top-level `items` as the complete set of `kind` resources
    /// for `integration` and returns how many were written.
    ///
    /// If writing the new set fails the previous set stays in place.
    pub async fn reconcile(
        &self,
        integration: &Integration,
        kind: ResourceKind,
        items: Vec<ProviderItem>,
        is_top_level: &(dyn Fn(&ProviderItem) -> bool + Send + Sync),
    ) -> AccessResult<u64> {
        let integration_id = integration
            .id
            .ok_or(AccessError::NotFound(Entity::Integration))?;
        let now = DateTime::now();
        let generation = ObjectId::new();

        let mut seen = HashSet::new();
        let rows: Vec<Resource> = items
            .into_iter()
            .filter(|item| !item.id.is_empty() && is_top_level(item))
            .filter(|item| seen.insert(item.id.clone()))
            .map(|item| Resource {
                id: None,
                organization_id: integration.organization_id,
                integration_id,
                resource_id: item.id,
                kind,
                name: item.title.unwrap_or_else(|| UNTITLED.to_string()),
                url: item.url,
                status: ResourceStatus::Active,
                sync_generation: generation,
                last_synced_at: now,
                created_at: now,
            })
            .collect();

        let stored = self
            .resources
            .replace_resources(integration_id, kind, generation, rows)
            .await?;
        self.integrations
            .touch_last_synced(integration_id, now)
            .await?;

        info!(
            %integration_id,
            kind = kind.as_str(),
            stored,
            "Resources reconciled"
        );
        Ok(stored)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub integration_id: String,
    pub kind: ResourceKind,
    pub pages: u32,
    pub fetched: usize,
    pub stored: u64,
}

/// Pulls a provider listing with the caller's credential and reconciles it.
pub struct SyncService {
    credentials: Arc<CredentialService>,
    reconciler: Reconciler,
    client: reqwest::Client,
    max_pages: u32,
    page_size: u32,
}

impl SyncService {
    pub fn new(
        credentials: Arc<CredentialService>,
        stores: &Stores,
        client: reqwest::Client,
        settings: &SyncSettings,
    ) -> Self {
        Self {
            credentials,
            reconciler: Reconciler::new(stores),
            client,
            max_pages: settings.max_pages.max(1),
            page_size: settings.page_size,
        }
    }

    pub async fn sync(
        &self,
        integration_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<SyncReport> {
        let integration = self
            .credentials
            .integration_for_member(integration_id, user_id)
            .await?;
        let access_token = self.credentials.access_token(integration_id, user_id).await?;
        let provider = provider_for(&integration, self.client.clone(), self.page_size);

        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        loop {
            if pages == self.max_pages {
                warn!(%integration_id, pages, "Listing not drained; keeping previous resources");
                return Err(AccessError::SyncFailed(format!(
                    "listing did not finish within {} pages",
                    self.max_pages
                )));
            }

            let page = provider
                .list_page(&access_token, cursor.as_deref())
                .await
                .map_err(|e| {
                    warn!(
                        %integration_id,
                        provider = provider.provider().as_str(),
                        error = %e,
                        "Provider listing failed"
                    );
                    AccessError::SyncFailed(e.to_string())
                })?;
            pages += 1;
            items.extend(page.items);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let fetched = items.len();
        let kind = provider.resource_kind();
        let is_top_level = |item: &ProviderItem| provider.is_top_level(item);
        let stored = self
            .reconciler
            .reconcile(&integration, kind, items, &is_top_level)
            .await?;

        Ok(SyncReport {
            integration_id: integration_id.to_hex(),
            kind,
            pages,
            fetched,
            stored,
        })
    }
}

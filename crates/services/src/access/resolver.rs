use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bson::oid::ObjectId;
use gatehouse_db::models::Resource;

use crate::error::AccessResult;
use crate::store::{GroupStore, ResourceStore, Stores};

/// Most resources returned by one visibility query.
pub const RESOURCE_PAGE_CAP: usize = 50;

/// Computes which synced resources a user may see through group grants.
///
/// Visibility comes only from `ResourcePermission` rows on groups the user
/// belongs to. Owners get no implicit access.
#[derive(Clone)]
pub struct PermissionResolver {
    groups: Arc<dyn GroupStore>,
    resources: Arc<dyn ResourceStore>,
}

impl PermissionResolver {
    pub fn new(stores: &Stores) -> Self {
        Self {
            groups: stores.groups.clone(),
            resources: stores.resources.clone(),
        }
    }

    /// Distinct resource ids granted to any of the user's groups inside the
    /// organization, whether or not a synced resource currently carries them.
    pub async fn resolve_visible_resource_ids(
        &self,
        user_id: ObjectId,
        organization_id: ObjectId,
    ) -> AccessResult<BTreeSet<String>> {
        let group_ids = self
            .groups
            .find_user_group_ids(organization_id, user_id)
            .await?;
        if group_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        Ok(self
            .groups
            .find_granted_resource_ids(&group_ids)
            .await?
            .into_iter()
            .collect())
    }

    /// Active resources of the organization the user may see, ordered by
    /// resource id and capped at [`RESOURCE_PAGE_CAP`].
    pub async fn resolve_visible_resources(
        &self,
        user_id: ObjectId,
        organization_id: ObjectId,
    ) -> AccessResult<Vec<Resource>> {
        let ids = self
            .resolve_visible_resource_ids(user_id, organization_id)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ids.into_iter().collect();
        let rows = self
            .resources
            .find_active_by_resource_ids(organization_id, &ids, RESOURCE_PAGE_CAP)
            .await?;
        Ok(latest_generation_only(rows))
    }

    pub async fn can_view(
        &self,
        user_id: ObjectId,
        organization_id: ObjectId,
        resource_id: &str,
    ) -> AccessResult<bool> {
        let ids = self
            .resolve_visible_resource_ids(user_id, organization_id)
            .await?;
        if !ids.contains(resource_id) {
            return Ok(false);
        }

        let found = self
            .resources
            .find_active_by_resource_ids(organization_id, &[resource_id.to_string()], 1)
            .await?;
        Ok(!found.is_empty())
    }
}

/// Keeps one row per (integration, resource id), the one from the newest
/// sync generation. Older generations linger only when a swap could not
/// delete them.
fn latest_generation_only(rows: Vec<Resource>) -> Vec<Resource> {
    let mut newest: HashMap<(ObjectId, String), ObjectId> = HashMap::new();
    for row in &rows {
        newest
            .entry((row.integration_id, row.resource_id.clone()))
            .and_modify(|g| *g = (*g).max(row.sync_generation))
            .or_insert(row.sync_generation);
    }

    rows.into_iter()
        .filter(|row| {
            newest.get(&(row.integration_id, row.resource_id.clone())) == Some(&row.sync_generation)
        })
        .collect()
}

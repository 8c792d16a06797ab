use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Document,
    File,
    Calendar,
    Repository,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Document => "document",
            ResourceKind::File => "file",
            ResourceKind::Calendar => "calendar",
            ResourceKind::Repository => "repository",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Active,
    Inactive,
}

/// An item synced from an integration's provider.
///
/// `resource_id` is the provider's identifier and stays stable across syncs,
/// which is what permission grants point at. `_id` changes on every sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub integration_id: ObjectId,
    pub resource_id: String,
    pub kind: ResourceKind,
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub status: ResourceStatus,
    pub sync_generation: ObjectId,
    pub last_synced_at: DateTime,
    pub created_at: DateTime,
}

impl Resource {
    pub const COLLECTION: &'static str = "resources";

    pub fn is_active(&self) -> bool {
        self.status == ResourceStatus::Active
    }
}

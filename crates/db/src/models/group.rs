use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Group {
    pub const COLLECTION: &'static str = "groups";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub group_id: ObjectId,
    pub organization_id: ObjectId,
    pub user_id: ObjectId,
    pub created_at: DateTime,
}

impl GroupMember {
    pub const COLLECTION: &'static str = "group_members";
}

/// Grants every member of `group_id` visibility of `resource_id`.
/// There are no negative grants; the row existing is the whole signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePermission {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub group_id: ObjectId,
    pub organization_id: ObjectId,
    pub resource_id: String,
    pub created_at: DateTime,
}

impl ResourcePermission {
    pub const COLLECTION: &'static str = "resource_permissions";
}

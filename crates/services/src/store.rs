//! Storage seams used by the access-control and credential services.
//!
//! Every trait has a MongoDB implementation under [`crate::dao`] and an
//! in-process one in [`crate::memory`]. [`Stores`] bundles one of each.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use gatehouse_db::models::{
    Credential, Group, GroupMember, Integration, Member, MemberRole, Organization, Resource,
    ResourceKind, ResourcePermission, TokenSet, User,
};
use mongodb::Database;

use crate::dao::{
    base::DaoResult, credential::CredentialDao, group::GroupDao, integration::IntegrationDao,
    member::MemberDao, organization::OrganizationDao, resource::ResourceDao, user::UserDao,
};
use crate::memory::MemoryStore;

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn insert_organization(&self, name: String, slug: String) -> DaoResult<Organization>;
    async fn find_organization(&self, id: ObjectId) -> DaoResult<Option<Organization>>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn insert_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<Member>;
    async fn find_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<Member>>;
    async fn find_memberships(&self, user_id: ObjectId) -> DaoResult<Vec<Member>>;
    async fn update_role(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<bool>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn insert_group(
        &self,
        organization_id: ObjectId,
        name: String,
        description: Option<String>,
    ) -> DaoResult<Group>;
    async fn find_group(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
    ) -> DaoResult<Option<Group>>;
    async fn add_group_member(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<GroupMember>;
    /// Groups inside `organization_id` that list `user_id` as a member.
    async fn find_user_group_ids(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Vec<ObjectId>>;
    async fn grant(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
        resource_id: String,
    ) -> DaoResult<ResourcePermission>;
    async fn revoke(&self, group_id: ObjectId, resource_id: &str) -> DaoResult<bool>;
    /// Resource ids granted to any of `group_ids`. May contain duplicates.
    async fn find_granted_resource_ids(&self, group_ids: &[ObjectId]) -> DaoResult<Vec<String>>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Active resources of `organization_id` whose `resource_id` is listed,
    /// ordered by `resource_id` then `_id`, at most `limit` rows.
    async fn find_active_by_resource_ids(
        &self,
        organization_id: ObjectId,
        resource_ids: &[String],
        limit: usize,
    ) -> DaoResult<Vec<Resource>>;
    /// Swaps the stored set for `(integration_id, kind)` to `rows`.
    ///
    /// Rows are written under `generation` before older generations are
    /// removed, so readers never observe an empty set mid-swap.
    async fn replace_resources(
        &self,
        integration_id: ObjectId,
        kind: ResourceKind,
        generation: ObjectId,
        rows: Vec<Resource>,
    ) -> DaoResult<u64>;
    async fn count_resources(
        &self,
        integration_id: ObjectId,
        kind: ResourceKind,
    ) -> DaoResult<u64>;
    async fn delete_integration_resources(&self, integration_id: ObjectId) -> DaoResult<u64>;
}

#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn insert_integration(&self, integration: Integration) -> DaoResult<Integration>;
    async fn find_integration(&self, id: ObjectId) -> DaoResult<Option<Integration>>;
    async fn list_integrations(&self, organization_id: ObjectId) -> DaoResult<Vec<Integration>>;
    async fn touch_last_synced(&self, id: ObjectId, at: DateTime) -> DaoResult<bool>;
    async fn delete_integration(&self, id: ObjectId) -> DaoResult<bool>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
    ) -> DaoResult<Option<Credential>>;
    /// Inserts or overwrites the credential for the pair.
    async fn upsert_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
        tokens: &TokenSet,
    ) -> DaoResult<Credential>;
    /// Writes `tokens` only if the stored version still equals
    /// `expected_version`; otherwise fails with `DaoError::Conflict`.
    async fn replace_if_version(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
        expected_version: i64,
        tokens: &TokenSet,
    ) -> DaoResult<Credential>;
    async fn delete_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
    ) -> DaoResult<bool>;
    async fn delete_integration_credentials(&self, integration_id: ObjectId) -> DaoResult<u64>;
}

/// The hosted identity backend.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn create_identity(&self, email: String, display_name: String) -> DaoResult<User>;
    async fn find_identity(&self, user_id: ObjectId) -> DaoResult<Option<User>>;
    /// Removes the identity together with its memberships, group memberships
    /// and credentials.
    async fn delete_identity(&self, user_id: ObjectId) -> DaoResult<()>;
    async fn set_password(&self, user_id: ObjectId, new_password: &str) -> DaoResult<()>;
}

#[derive(Clone)]
pub struct Stores {
    pub organizations: Arc<dyn OrganizationStore>,
    pub members: Arc<dyn MemberStore>,
    pub groups: Arc<dyn GroupStore>,
    pub resources: Arc<dyn ResourceStore>,
    pub integrations: Arc<dyn IntegrationStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub identities: Arc<dyn IdentityBackend>,
}

impl Stores {
    pub fn mongo(db: &Database) -> Self {
        Self {
            organizations: Arc::new(OrganizationDao::new(db)),
            members: Arc::new(MemberDao::new(db)),
            groups: Arc::new(GroupDao::new(db)),
            resources: Arc::new(ResourceDao::new(db)),
            integrations: Arc::new(IntegrationDao::new(db)),
            credentials: Arc::new(CredentialDao::new(db)),
            identities: Arc::new(UserDao::new(db)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            organizations: store.clone(),
            members: store.clone(),
            groups: store.clone(),
            resources: store.clone(),
            integrations: store.clone(),
            credentials: store.clone(),
            identities: store,
        }
    }
}

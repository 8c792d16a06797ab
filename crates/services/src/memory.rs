//! In-process implementation of every store trait.
//!
//! Backs `database.backend = "memory"` and the test suites. All collections
//! sit behind one lock, so multi-collection writes (identity cascade,
//! resource swap) are atomic to readers.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use gatehouse_db::models::{
    Credential, Group, GroupMember, Integration, Member, MemberRole, Organization, Resource,
    ResourceKind, ResourcePermission, TokenSet, User,
};
use parking_lot::RwLock;

use crate::auth::hash_password;
use crate::dao::base::{DaoError, DaoResult};
use crate::store::{
    CredentialStore, GroupStore, IdentityBackend, IntegrationStore, MemberStore,
    OrganizationStore, ResourceStore,
};

#[derive(Default)]
struct MemoryState {
    organizations: HashMap<ObjectId, Organization>,
    users: HashMap<ObjectId, User>,
    members: Vec<Member>,
    groups: HashMap<ObjectId, Group>,
    group_members: Vec<GroupMember>,
    permissions: Vec<ResourcePermission>,
    resources: Vec<Resource>,
    integrations: HashMap<ObjectId, Integration>,
    credentials: Vec<Credential>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(what: &str) -> DaoError {
    DaoError::DuplicateKey(what.to_string())
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn insert_organization(&self, name: String, slug: String) -> DaoResult<Organization> {
        let mut state = self.state.write();
        if state.organizations.values().any(|o| o.slug == slug) {
            return Err(duplicate("organizations.slug"));
        }

        let now = DateTime::now();
        let id = ObjectId::new();
        let organization = Organization {
            id: Some(id),
            name,
            slug,
            created_at: now,
            updated_at: now,
        };
        state.organizations.insert(id, organization.clone());
        Ok(organization)
    }

    async fn find_organization(&self, id: ObjectId) -> DaoResult<Option<Organization>> {
        Ok(self.state.read().organizations.get(&id).cloned())
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn insert_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<Member> {
        let mut state = self.state.write();
        if state
            .members
            .iter()
            .any(|m| m.organization_id == organization_id && m.user_id == user_id)
        {
            return Err(duplicate("members.organization_id_user_id"));
        }

        let now = DateTime::now();
        let member = Member {
            id: Some(ObjectId::new()),
            organization_id,
            user_id,
            role,
            joined_at: now,
            created_at: now,
            updated_at: now,
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn find_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<Member>> {
        Ok(self
            .state
            .read()
            .members
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_memberships(&self, user_id: ObjectId) -> DaoResult<Vec<Member>> {
        Ok(self
            .state
            .read()
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_role(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> DaoResult<bool> {
        let mut state = self.state.write();
        match state
            .members
            .iter_mut()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
        {
            Some(member) => {
                member.role = role;
                member.updated_at = DateTime::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn insert_group(
        &self,
        organization_id: ObjectId,
        name: String,
        description: Option<String>,
    ) -> DaoResult<Group> {
        let mut state = self.state.write();
        if state
            .groups
            .values()
            .any(|g| g.organization_id == organization_id && g.name == name)
        {
            return Err(duplicate("groups.organization_id_name"));
        }

        let now = DateTime::now();
        let id = ObjectId::new();
        let group = Group {
            id: Some(id),
            organization_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        };
        state.groups.insert(id, group.clone());
        Ok(group)
    }

    async fn find_group(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
    ) -> DaoResult<Option<Group>> {
        Ok(self
            .state
            .read()
            .groups
            .get(&group_id)
            .filter(|g| g.organization_id == organization_id)
            .cloned())
    }

    async fn add_group_member(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<GroupMember> {
        let mut state = self.state.write();
        if state
            .group_members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
        {
            return Err(duplicate("group_members.group_id_user_id"));
        }

        let member = GroupMember {
            id: Some(ObjectId::new()),
            group_id,
            organization_id,
            user_id,
            created_at: DateTime::now(),
        };
        state.group_members.push(member.clone());
        Ok(member)
    }

    async fn find_user_group_ids(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Vec<ObjectId>> {
        Ok(self
            .state
            .read()
            .group_members
            .iter()
            .filter(|m| m.organization_id == organization_id && m.user_id == user_id)
            .map(|m| m.group_id)
            .collect())
    }

    async fn grant(
        &self,
        organization_id: ObjectId,
        group_id: ObjectId,
        resource_id: String,
    ) -> DaoResult<ResourcePermission> {
        let mut state = self.state.write();
        if state
            .permissions
            .iter()
            .any(|p| p.group_id == group_id && p.resource_id == resource_id)
        {
            return Err(duplicate("resource_permissions.group_id_resource_id"));
        }

        let permission = ResourcePermission {
            id: Some(ObjectId::new()),
            group_id,
            organization_id,
            resource_id,
            created_at: DateTime::now(),
        };
        state.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn revoke(&self, group_id: ObjectId, resource_id: &str) -> DaoResult<bool> {
        let mut state = self.state.write();
        let before = state.permissions.len();
        state
            .permissions
            .retain(|p| !(p.group_id == group_id && p.resource_id == resource_id));
        Ok(state.permissions.len() < before)
    }

    async fn find_granted_resource_ids(&self, group_ids: &[ObjectId]) -> DaoResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .permissions
            .iter()
            .filter(|p| group_ids.contains(&p.group_id))
            .map(|p| p.resource_id.clone())
            .collect())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn find_active_by_resource_ids(
        &self,
        organization_id: ObjectId,
        resource_ids: &[String],
        limit: usize,
    ) -> DaoResult<Vec<Resource>> {
        let state = self.state.read();
        let mut rows: Vec<Resource> = state
            .resources
            .iter()
            .filter(|r| {
                r.organization_id == organization_id
                    && r.is_active()
                    && resource_ids.contains(&r.resource_id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.resource_id, a.id).cmp(&(&b.resource_id, b.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn replace_resources(
        &self,
        integration_id: ObjectId,
        kind: ResourceKind,
        generation: ObjectId,
        rows: Vec<Resource>,
    ) -> DaoResult<u64> {
        let mut state = self.state.write();
        let inserted = rows.len() as u64;
        state.resources.retain(|r| {
            !(r.integration_id == integration_id
                && r.kind == kind
                && r.sync_generation != generation)
        });
        state.resources.extend(rows.into_iter().map(|mut r| {
            r.id.get_or_insert_with(ObjectId::new);
            r
        }));
        Ok(inserted)
    }

    async fn count_resources(
        &self,
        integration_id: ObjectId,
        kind: ResourceKind,
    ) -> DaoResult<u64> {
        Ok(self
            .state
            .read()
            .resources
            .iter()
            .filter(|r| r.integration_id == integration_id && r.kind == kind)
            .count() as u64)
    }

    async fn delete_integration_resources(&self, integration_id: ObjectId) -> DaoResult<u64> {
        let mut state = self.state.write();
        let before = state.resources.len();
        state.resources.retain(|r| r.integration_id != integration_id);
        Ok((before - state.resources.len()) as u64)
    }
}

#[async_trait]
impl IntegrationStore for MemoryStore {
    async fn insert_integration(&self, mut integration: Integration) -> DaoResult<Integration> {
        let id = *integration.id.get_or_insert_with(ObjectId::new);
        let mut state = self.state.write();
        if state.integrations.contains_key(&id) {
            return Err(duplicate("integrations._id"));
        }
        state.integrations.insert(id, integration.clone());
        Ok(integration)
    }

    async fn find_integration(&self, id: ObjectId) -> DaoResult<Option<Integration>> {
        Ok(self.state.read().integrations.get(&id).cloned())
    }

    async fn list_integrations(&self, organization_id: ObjectId) -> DaoResult<Vec<Integration>> {
        let mut integrations: Vec<Integration> = self
            .state
            .read()
            .integrations
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        integrations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(integrations)
    }

    async fn touch_last_synced(&self, id: ObjectId, at: DateTime) -> DaoResult<bool> {
        let mut state = self.state.write();
        match state.integrations.get_mut(&id) {
            Some(integration) => {
                integration.last_synced_at = Some(at);
                integration.updated_at = DateTime::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_integration(&self, id: ObjectId) -> DaoResult<bool> {
        Ok(self.state.write().integrations.remove(&id).is_some())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
    ) -> DaoResult<Option<Credential>> {
        Ok(self
            .state
            .read()
            .credentials
            .iter()
            .find(|c| c.user_id == user_id && c.integration_id == integration_id)
            .cloned())
    }

    async fn upsert_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
        tokens: &TokenSet,
    ) -> DaoResult<Credential> {
        let mut state = self.state.write();
        let now = DateTime::now();

        if let Some(existing) = state
            .credentials
            .iter_mut()
            .find(|c| c.user_id == user_id && c.integration_id == integration_id)
        {
            apply_tokens(existing, tokens, now);
            return Ok(existing.clone());
        }

        let credential = Credential {
            id: Some(ObjectId::new()),
            user_id,
            integration_id,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at,
            scope: tokens.scope.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        state.credentials.push(credential.clone());
        Ok(credential)
    }

    async fn replace_if_version(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
        expected_version: i64,
        tokens: &TokenSet,
    ) -> DaoResult<Credential> {
        let mut state = self.state.write();
        let existing = state
            .credentials
            .iter_mut()
            .find(|c| {
                c.user_id == user_id
                    && c.integration_id == integration_id
                    && c.version == expected_version
            })
            .ok_or(DaoError::Conflict)?;

        apply_tokens(existing, tokens, DateTime::now());
        Ok(existing.clone())
    }

    async fn delete_credential(
        &self,
        user_id: ObjectId,
        integration_id: ObjectId,
    ) -> DaoResult<bool> {
        let mut state = self.state.write();
        let before = state.credentials.len();
        state
            .credentials
            .retain(|c| !(c.user_id == user_id && c.integration_id == integration_id));
        Ok(state.credentials.len() < before)
    }

    async fn delete_integration_credentials(&self, integration_id: ObjectId) -> DaoResult<u64> {
        let mut state = self.state.write();
        let before = state.credentials.len();
        state.credentials.retain(|c| c.integration_id != integration_id);
        Ok((before - state.credentials.len()) as u64)
    }
}

fn apply_tokens(credential: &mut Credential, tokens: &TokenSet, now: DateTime) {
    credential.access_token = tokens.access_token.clone();
    credential.refresh_token = tokens.refresh_token.clone();
    credential.expires_at = tokens.expires_at;
    credential.scope = tokens.scope.clone();
    credential.version += 1;
    credential.updated_at = now;
}

#[async_trait]
impl IdentityBackend for MemoryStore {
    async fn create_identity(&self, email: String, display_name: String) -> DaoResult<User> {
        let mut state = self.state.write();
        if state.users.values().any(|u| u.email == email) {
            return Err(duplicate("users.email"));
        }

        let now = DateTime::now();
        let id = ObjectId::new();
        let user = User {
            id: Some(id),
            email,
            display_name,
            password_hash: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_identity(&self, user_id: ObjectId) -> DaoResult<Option<User>> {
        Ok(self.state.read().users.get(&user_id).cloned())
    }

    async fn delete_identity(&self, user_id: ObjectId) -> DaoResult<()> {
        let mut state = self.state.write();
        if state.users.remove(&user_id).is_none() {
            return Err(DaoError::NotFound);
        }
        state.members.retain(|m| m.user_id != user_id);
        state.group_members.retain(|m| m.user_id != user_id);
        state.credentials.retain(|c| c.user_id != user_id);
        Ok(())
    }

    async fn set_password(&self, user_id: ObjectId, new_password: &str) -> DaoResult<()> {
        if !self.state.read().users.contains_key(&user_id) {
            return Err(DaoError::NotFound);
        }

        // argon2 runs outside the lock
        let password_hash =
            hash_password(new_password).map_err(|e| DaoError::PasswordHash(e.to_string()))?;

        let mut state = self.state.write();
        let user = state.users.get_mut(&user_id).ok_or(DaoError::NotFound)?;
        user.password_hash = Some(password_hash);
        user.updated_at = DateTime::now();
        Ok(())
    }
}

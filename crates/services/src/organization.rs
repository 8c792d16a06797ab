use std::sync::Arc;

use bson::oid::ObjectId;
use gatehouse_db::models::{Member, MemberRole, Organization};
use tracing::info;

use crate::access::Authorizer;
use crate::auth::Session;
use crate::error::{AccessError, AccessResult, Entity};
use crate::store::{IdentityBackend, MemberStore, OrganizationStore, Stores};

const SLUG_SUFFIX_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

pub struct OrganizationService {
    authorizer: Authorizer,
    organizations: Arc<dyn OrganizationStore>,
    members: Arc<dyn MemberStore>,
    identities: Arc<dyn IdentityBackend>,
}

impl OrganizationService {
    pub fn new(authorizer: Authorizer, stores: &Stores) -> Self {
        Self {
            authorizer,
            organizations: stores.organizations.clone(),
            members: stores.members.clone(),
            identities: stores.identities.clone(),
        }
    }

    /// Creates an organization owned by the caller.
    pub async fn create(
        &self,
        session: Option<&Session>,
        name: &str,
    ) -> AccessResult<(Organization, Member)> {
        let session = session.ok_or(AccessError::Unauthenticated)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AccessError::InvalidInput("name"));
        }

        let organization = self
            .organizations
            .insert_organization(name.to_string(), slugify(name))
            .await?;
        let organization_id = organization
            .id
            .ok_or(AccessError::NotFound(Entity::Organization))?;
        let owner = self
            .members
            .insert_member(organization_id, session.user_id, MemberRole::Owner)
            .await?;

        info!(
            %organization_id,
            owner = %session.user_id,
            slug = %organization.slug,
            "Organization created"
        );
        Ok((organization, owner))
    }

    /// Owner adds an existing identity to the organization.
    pub async fn add_member(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: MemberRole,
    ) -> AccessResult<Member> {
        self.authorizer
            .require_owner(session, organization_id)
            .await?;
        self.identities
            .find_identity(user_id)
            .await?
            .ok_or(AccessError::NotFound(Entity::User))?;

        let member = self
            .members
            .insert_member(organization_id, user_id, role)
            .await?;
        info!(%organization_id, %user_id, role = role.as_str(), "Member added");
        Ok(member)
    }
}

/// Lowercase ASCII slug with a random suffix, e.g. `acme-corp-x81kq2`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 7);
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    if !slug.is_empty() && !slug.ends_with('-') {
        slug.push('-');
    }
    slug.push_str(&nanoid::nanoid!(6, &SLUG_SUFFIX_ALPHABET));
    slug
}

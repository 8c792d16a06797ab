use std::fmt;
use std::sync::Arc;

use bson::oid::ObjectId;
use gatehouse_db::models::{Member, MemberRole};

use crate::auth::Session;
use crate::error::{AccessError, AccessResult, Entity, ForbiddenReason};
use crate::store::{MemberStore, Stores};

pub const MIN_PASSWORD_LEN: usize = 8;

/// An administrative action one member performs on another.
#[derive(Clone, PartialEq, Eq)]
pub enum PrivilegedAction {
    DeleteMember,
    ResetPassword { new_password: String },
    ChangeRole { role: MemberRole },
}

impl PrivilegedAction {
    pub fn name(&self) -> &'static str {
        match self {
            PrivilegedAction::DeleteMember => "delete_member",
            PrivilegedAction::ResetPassword { .. } => "reset_password",
            PrivilegedAction::ChangeRole { .. } => "change_role",
        }
    }
}

// Keeps passwords out of logs.
impl fmt::Debug for PrivilegedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegedAction::DeleteMember => f.write_str("DeleteMember"),
            PrivilegedAction::ResetPassword { .. } => f
                .debug_struct("ResetPassword")
                .field("new_password", &"<redacted>")
                .finish(),
            PrivilegedAction::ChangeRole { role } => {
                f.debug_struct("ChangeRole").field("role", role).finish()
            }
        }
    }
}

/// Proof that every gate passed. Only [`Authorizer::authorize`] builds one.
#[derive(Debug, Clone)]
pub struct AuthorizedAction {
    organization_id: ObjectId,
    requestor_id: ObjectId,
    target_user_id: ObjectId,
    action: PrivilegedAction,
}

impl AuthorizedAction {
    pub fn organization_id(&self) -> ObjectId {
        self.organization_id
    }

    pub fn requestor_id(&self) -> ObjectId {
        self.requestor_id
    }

    pub fn target_user_id(&self) -> ObjectId {
        self.target_user_id
    }

    pub fn action(&self) -> &PrivilegedAction {
        &self.action
    }
}

/// Decides whether a session may act on a member or administer an
/// organization. Never mutates anything.
#[derive(Clone)]
pub struct Authorizer {
    members: Arc<dyn MemberStore>,
}

impl Authorizer {
    pub fn new(stores: &Stores) -> Self {
        Self {
            members: stores.members.clone(),
        }
    }

    /// Runs the gates in order and fails on the first one that does not hold:
    /// session, requestor membership, owner role, target membership, then the
    /// action's own guard.
    pub async fn authorize(
        &self,
        session: Option<&Session>,
        target_user_id: ObjectId,
        organization_scope: Option<ObjectId>,
        action: PrivilegedAction,
    ) -> AccessResult<AuthorizedAction> {
        let session = session.ok_or(AccessError::Unauthenticated)?;
        let requestor = self.resolve_scope(session.user_id, organization_scope).await?;
        if !requestor.is_owner() {
            return Err(AccessError::Forbidden(ForbiddenReason::Role));
        }

        let organization_id = requestor.organization_id;
        self.members
            .find_member(organization_id, target_user_id)
            .await?
            .ok_or(AccessError::Forbidden(ForbiddenReason::CrossTenant))?;

        let is_self = target_user_id == session.user_id;
        match &action {
            PrivilegedAction::DeleteMember if is_self => {
                return Err(AccessError::Forbidden(ForbiddenReason::SelfDelete));
            }
            PrivilegedAction::ResetPassword { new_password }
                if new_password.chars().count() < MIN_PASSWORD_LEN =>
            {
                return Err(AccessError::InvalidInput("new_password"));
            }
            PrivilegedAction::ChangeRole { role } if is_self && *role != MemberRole::Owner => {
                return Err(AccessError::Forbidden(ForbiddenReason::SelfDemote));
            }
            _ => {}
        }

        Ok(AuthorizedAction {
            organization_id,
            requestor_id: session.user_id,
            target_user_id,
            action,
        })
    }

    /// Session present and a member of `organization_id`.
    pub async fn require_member(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
    ) -> AccessResult<Member> {
        let session = session.ok_or(AccessError::Unauthenticated)?;
        self.resolve_scope(session.user_id, Some(organization_id))
            .await
    }

    /// Session present and an owner of `organization_id`.
    pub async fn require_owner(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
    ) -> AccessResult<Member> {
        let member = self.require_member(session, organization_id).await?;
        if member.is_owner() {
            Ok(member)
        } else {
            Err(AccessError::Forbidden(ForbiddenReason::Role))
        }
    }

    async fn resolve_scope(
        &self,
        user_id: ObjectId,
        organization_scope: Option<ObjectId>,
    ) -> AccessResult<Member> {
        if let Some(organization_id) = organization_scope {
            return self
                .members
                .find_member(organization_id, user_id)
                .await?
                .ok_or(AccessError::NotFound(Entity::Organization));
        }

        let mut memberships = self.members.find_memberships(user_id).await?;
        match memberships.len() {
            0 => Err(AccessError::NotFound(Entity::Organization)),
            1 => Ok(memberships.remove(0)),
            _ => Err(AccessError::InvalidInput("organization_id")),
        }
    }
}

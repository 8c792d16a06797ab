use std::sync::Arc;

use bson::oid::ObjectId;
use gatehouse_db::models::MemberRole;
use tracing::info;

use super::authorizer::{AuthorizedAction, Authorizer, PrivilegedAction};
use crate::auth::Session;
use crate::dao::base::DaoError;
use crate::error::{AccessError, AccessResult, Entity};
use crate::store::{IdentityBackend, MemberStore, Stores};

/// What an executed administrative action touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminReceipt {
    pub organization_id: ObjectId,
    pub target_user_id: ObjectId,
    pub action: &'static str,
}

/// Runs privileged member actions once the [`Authorizer`] has approved them.
pub struct MemberAdminService {
    authorizer: Authorizer,
    identities: Arc<dyn IdentityBackend>,
    members: Arc<dyn MemberStore>,
}

impl MemberAdminService {
    pub fn new(authorizer: Authorizer, stores: &Stores) -> Self {
        Self {
            authorizer,
            identities: stores.identities.clone(),
            members: stores.members.clone(),
        }
    }

    pub async fn delete_member(
        &self,
        session: Option<&Session>,
        target_user_id: ObjectId,
        organization_scope: Option<ObjectId>,
    ) -> AccessResult<AdminReceipt> {
        let authorized = self
            .authorizer
            .authorize(
                session,
                target_user_id,
                organization_scope,
                PrivilegedAction::DeleteMember,
            )
            .await?;
        self.execute(authorized).await
    }

    pub async fn reset_password(
        &self,
        session: Option<&Session>,
        target_user_id: ObjectId,
        organization_scope: Option<ObjectId>,
        new_password: String,
    ) -> AccessResult<AdminReceipt> {
        let authorized = self
            .authorizer
            .authorize(
                session,
                target_user_id,
                organization_scope,
                PrivilegedAction::ResetPassword { new_password },
            )
            .await?;
        self.execute(authorized).await
    }

    pub async fn change_role(
        &self,
        session: Option<&Session>,
        target_user_id: ObjectId,
        organization_id: ObjectId,
        role: MemberRole,
    ) -> AccessResult<AdminReceipt> {
        let authorized = self
            .authorizer
            .authorize(
                session,
                target_user_id,
                Some(organization_id),
                PrivilegedAction::ChangeRole { role },
            )
            .await?;
        self.execute(authorized).await
    }

    /// Performs an approved action against the identity backend or the
    /// member store.
    pub async fn execute(&self, authorized: AuthorizedAction) -> AccessResult<AdminReceipt> {
        let organization_id = authorized.organization_id();
        let target_user_id = authorized.target_user_id();

        match authorized.action() {
            PrivilegedAction::DeleteMember => self
                .identities
                .delete_identity(target_user_id)
                .await
                .map_err(user_not_found)?,
            PrivilegedAction::ResetPassword { new_password } => self
                .identities
                .set_password(target_user_id, new_password)
                .await
                .map_err(user_not_found)?,
            PrivilegedAction::ChangeRole { role } => {
                if !self
                    .members
                    .update_role(organization_id, target_user_id, *role)
                    .await?
                {
                    return Err(AccessError::NotFound(Entity::Member));
                }
            }
        }

        info!(
            %organization_id,
            actor = %authorized.requestor_id(),
            target = %target_user_id,
            action = authorized.action().name(),
            "Privileged action performed"
        );

        Ok(AdminReceipt {
            organization_id,
            target_user_id,
            action: authorized.action().name(),
        })
    }
}

fn user_not_found(e: DaoError) -> AccessError {
    match e {
        DaoError::NotFound => AccessError::NotFound(Entity::User),
        other => other.into(),
    }
}

use std::fmt;

use thiserror::Error;

use crate::dao::base::DaoError;

/// Why an authenticated caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    Role,
    CrossTenant,
    SelfDelete,
    SelfDemote,
}

impl ForbiddenReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForbiddenReason::Role => "role",
            ForbiddenReason::CrossTenant => "cross-tenant",
            ForbiddenReason::SelfDelete => "self-delete",
            ForbiddenReason::SelfDemote => "self-demote",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Organization,
    Member,
    Group,
    Integration,
    Credential,
    Permission,
    User,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Organization => "organization",
            Entity::Member => "member",
            Entity::Group => "group",
            Entity::Integration => "integration",
            Entity::Credential => "credential",
            Entity::Permission => "permission",
            Entity::User => "user",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Forbidden: {0}")]
    Forbidden(ForbiddenReason),
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("No refresh token stored; re-authorization required")]
    NoRefreshToken,
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("Sync failed: {0}")]
    SyncFailed(String),
    #[error("Storage error: {0}")]
    Storage(#[from] DaoError),
}

impl AccessError {
    /// Stable, machine-checkable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "unauthenticated",
            AccessError::Forbidden(_) => "forbidden",
            AccessError::NotFound(_) => "not_found",
            AccessError::InvalidInput(_) => "invalid_input",
            AccessError::NoRefreshToken => "no_refresh_token",
            AccessError::RefreshFailed(_) => "refresh_failed",
            AccessError::SyncFailed(_) => "sync_failed",
            AccessError::Storage(_) => "storage_error",
        }
    }

    /// The refusal reason, missing entity or offending field, when the kind
    /// carries one.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AccessError::Forbidden(reason) => Some(reason.as_str()),
            AccessError::NotFound(entity) => Some(entity.as_str()),
            AccessError::InvalidInput(field) => Some(*field),
            _ => None,
        }
    }
}


pub type AccessResult<T> = Result<T, AccessError>;

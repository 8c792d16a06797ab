pub mod access;
pub mod auth;
pub mod credential;
pub mod dao;
pub mod error;
pub mod integration;
pub mod memory;
pub mod oauth;
pub mod organization;
pub mod providers;
pub mod store;
pub mod sync;

pub use access::{Authorizer, GroupAdminService, MemberAdminService, PermissionResolver};
pub use auth::{AuthService, Session};
pub use credential::CredentialService;
pub use error::{AccessError, AccessResult, Entity, ForbiddenReason};
pub use integration::{IntegrationService, NewIntegration};
pub use memory::MemoryStore;
pub use oauth::{OAuthClient, StateSigner};
pub use organization::OrganizationService;
pub use store::Stores;
pub use sync::{Reconciler, SyncReport, SyncService};

pub mod credential;
pub mod group;
pub mod integration;
pub mod member;
pub mod organization;
pub mod resource;
pub mod user;

pub use credential::{Credential, TokenSet};
pub use group::{Group, GroupMember, ResourcePermission};
pub use integration::{Integration, ProviderKind};
pub use member::{Member, MemberRole};
pub use organization::Organization;
pub use resource::{Resource, ResourceKind, ResourceStatus};
pub use user::User;

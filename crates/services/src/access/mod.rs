//! Who may do what inside an organization.

pub mod admin;
pub mod authorizer;
pub mod groups;
pub mod resolver;

pub use admin::{AdminReceipt, MemberAdminService};
pub use authorizer::{AuthorizedAction, Authorizer, MIN_PASSWORD_LEN, PrivilegedAction};
pub use groups::GroupAdminService;
pub use resolver::{PermissionResolver, RESOURCE_PAGE_CAP};

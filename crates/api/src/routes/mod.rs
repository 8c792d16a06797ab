pub mod admin;
pub mod group;
pub mod integration;
pub mod member;
pub mod organization;
pub mod resource;

use bson::DateTime;

pub(crate) fn rfc3339(at: DateTime) -> String {
    at.to_chrono().to_rfc3339()
}

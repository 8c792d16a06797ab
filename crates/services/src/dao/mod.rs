pub mod base;
pub mod credential;
pub mod group;
pub mod integration;
pub mod member;
pub mod organization;
pub mod resource;
pub mod user;

pub use base::BaseDao;

pub mod auth;
pub mod organization;

use bson::oid::ObjectId;

use crate::error::ApiError;

/// Parses a hex ObjectId taken from a path or body field.
pub fn parse_id(raw: &str, field: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {}", field)))
}

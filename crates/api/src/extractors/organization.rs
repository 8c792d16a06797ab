use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use bson::oid::ObjectId;

use crate::error::ApiError;

/// The `{organization_id}` path segment, parsed.
#[derive(Debug, Clone, Copy)]
pub struct OrganizationId(pub ObjectId);

impl<S> FromRequestParts<S> for OrganizationId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params): Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Missing path parameters".to_string()))?;

        let raw = params
            .get("organization_id")
            .ok_or_else(|| ApiError::BadRequest("Missing organization_id parameter".to_string()))?;

        super::parse_id(raw, "organization_id").map(OrganizationId)
    }
}

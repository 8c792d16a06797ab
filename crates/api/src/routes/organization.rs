use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub role: String,
}

/// POST /api/organization
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    body.validate()?;

    let (organization, owner) = state
        .organizations
        .create(Some(&auth.session()), &body.name)
        .await?;

    Ok(Json(OrganizationResponse {
        id: owner.organization_id.to_hex(),
        name: organization.name,
        slug: organization.slug,
        role: owner.role.to_string(),
    }))
}

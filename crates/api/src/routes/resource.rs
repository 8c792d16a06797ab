use axum::{Json, extract::State};
use gatehouse_db::models::{Resource, ResourceKind};
use serde::Serialize;

use super::rfc3339;
use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, organization::OrganizationId},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub resource_id: String,
    pub integration_id: String,
    pub kind: ResourceKind,
    pub name: String,
    pub url: Option<String>,
    pub last_synced_at: String,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            id: r.id.map(|id| id.to_hex()).unwrap_or_default(),
            resource_id: r.resource_id,
            integration_id: r.integration_id.to_hex(),
            kind: r.kind,
            name: r.name,
            url: r.url,
            last_synced_at: rfc3339(r.last_synced_at),
        }
    }
}

/// GET /api/organization/{organization_id}/resource
///
/// Resources the caller can see through group grants, sorted by name.
pub async fn list(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    OrganizationId(organization_id): OrganizationId,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    let session = auth.map(|a| a.session());
    let member = state
        .authorizer
        .require_member(session.as_ref(), organization_id)
        .await?;

    let resources = state
        .resolver
        .resolve_visible_resources(member.user_id, organization_id)
        .await?;

    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

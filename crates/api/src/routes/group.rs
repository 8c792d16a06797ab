use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gatehouse_db::models::{Group, ResourcePermission};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, organization::OrganizationId, parse_id},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGroupMemberRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub resource_id: String,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Group> for GroupResponse {
    fn from(g: Group) -> Self {
        Self {
            id: g.id.map(|id| id.to_hex()).unwrap_or_default(),
            organization_id: g.organization_id.to_hex(),
            name: g.name,
            description: g.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupMemberResponse {
    pub group_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub group_id: String,
    pub resource_id: String,
}

impl From<ResourcePermission> for PermissionResponse {
    fn from(p: ResourcePermission) -> Self {
        Self {
            group_id: p.group_id.to_hex(),
            resource_id: p.resource_id,
        }
    }
}

/// POST /api/organization/{organization_id}/group
pub async fn create(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    OrganizationId(organization_id): OrganizationId,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    body.validate()?;
    let session = auth.map(|a| a.session());

    let group = state
        .groups
        .create_group(session.as_ref(), organization_id, &body.name, body.description)
        .await?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

/// POST /api/organization/{organization_id}/group/{group_id}/member
pub async fn add_member(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, group_id)): Path<(String, String)>,
    Json(body): Json<AddGroupMemberRequest>,
) -> Result<Json<GroupMemberResponse>, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let gid = parse_id(&group_id, "group_id")?;
    let uid = parse_id(&body.user_id, "userId")?;
    let session = auth.map(|a| a.session());

    let membership = state
        .groups
        .add_member(session.as_ref(), oid, gid, uid)
        .await?;

    Ok(Json(GroupMemberResponse {
        group_id: membership.group_id.to_hex(),
        user_id: membership.user_id.to_hex(),
    }))
}

/// POST /api/organization/{organization_id}/group/{group_id}/permission
pub async fn grant(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, group_id)): Path<(String, String)>,
    Json(body): Json<GrantRequest>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let gid = parse_id(&group_id, "group_id")?;
    let session = auth.map(|a| a.session());

    let permission = state
        .groups
        .grant(session.as_ref(), oid, gid, &body.resource_id)
        .await?;

    Ok(Json(permission.into()))
}

/// DELETE /api/organization/{organization_id}/group/{group_id}/permission/{resource_id}
pub async fn revoke(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, group_id, resource_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let gid = parse_id(&group_id, "group_id")?;
    let session = auth.map(|a| a.session());

    state
        .groups
        .revoke(session.as_ref(), oid, gid, &resource_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Json,
    extract::{Path, State},
};
use gatehouse_db::models::{Member, MemberRole};
use serde::{Deserialize, Serialize};

use super::admin::AdminActionResponse;
use super::rfc3339;
use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, organization::OrganizationId, parse_id},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: MemberRole,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub organization_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub joined_at: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            organization_id: member.organization_id.to_hex(),
            user_id: member.user_id.to_hex(),
            role: member.role,
            joined_at: rfc3339(member.joined_at),
        }
    }
}

/// POST /api/organization/{organization_id}/member
pub async fn add(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    OrganizationId(organization_id): OrganizationId,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let user_id = parse_id(&body.user_id, "userId")?;
    let session = auth.map(|a| a.session());

    let member = state
        .organizations
        .add_member(session.as_ref(), organization_id, user_id, body.role)
        .await?;

    Ok(Json(member.into()))
}

/// DELETE /api/organization/{organization_id}/member/{user_id}
pub async fn delete(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, user_id)): Path<(String, String)>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let uid = parse_id(&user_id, "user_id")?;
    let session = auth.map(|a| a.session());

    let receipt = state
        .admin
        .delete_member(session.as_ref(), uid, Some(oid))
        .await?;

    Ok(Json(receipt.into()))
}

/// PUT /api/organization/{organization_id}/member/{user_id}/password
pub async fn reset_password(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, user_id)): Path<(String, String)>,
    Json(body): Json<NewPasswordRequest>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let uid = parse_id(&user_id, "user_id")?;
    let session = auth.map(|a| a.session());

    let receipt = state
        .admin
        .reset_password(session.as_ref(), uid, Some(oid), body.new_password)
        .await?;

    Ok(Json(receipt.into()))
}

/// PUT /api/organization/{organization_id}/member/{user_id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, user_id)): Path<(String, String)>,
    Json(body): Json<ChangeRoleRequest>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let uid = parse_id(&user_id, "user_id")?;
    let session = auth.map(|a| a.session());

    let receipt = state
        .admin
        .change_role(session.as_ref(), uid, oid, body.role)
        .await?;

    Ok(Json(receipt.into()))
}

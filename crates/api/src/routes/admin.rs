use axum::{Json, extract::State};
use gatehouse_services::access::AdminReceipt;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, parse_id},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
    pub organization_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub user_id: String,
    pub new_password: String,
    pub organization_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminActionResponse {
    pub success: bool,
    pub action: String,
    pub organization_id: String,
    pub user_id: String,
}

impl From<AdminReceipt> for AdminActionResponse {
    fn from(receipt: AdminReceipt) -> Self {
        Self {
            success: true,
            action: receipt.action.to_string(),
            organization_id: receipt.organization_id.to_hex(),
            user_id: receipt.target_user_id.to_hex(),
        }
    }
}

fn optional_scope(raw: Option<&str>) -> Result<Option<bson::oid::ObjectId>, ApiError> {
    raw.map(|oid| parse_id(oid, "organizationId")).transpose()
}

/// POST /api/admin/delete-user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Json(body): Json<DeleteUserRequest>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let target = parse_id(&body.user_id, "userId")?;
    let scope = optional_scope(body.organization_id.as_deref())?;
    let session = auth.map(|a| a.session());

    let receipt = state
        .admin
        .delete_member(session.as_ref(), target, scope)
        .await?;

    Ok(Json(receipt.into()))
}

/// POST /api/admin/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let target = parse_id(&body.user_id, "userId")?;
    let scope = optional_scope(body.organization_id.as_deref())?;
    let session = auth.map(|a| a.session());

    let receipt = state
        .admin
        .reset_password(session.as_ref(), target, scope, body.new_password)
        .await?;

    Ok(Json(receipt.into()))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use gatehouse_db::models::{Credential, Integration, ProviderKind};
use gatehouse_services::{NewIntegration, SyncReport};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rfc3339;
use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, organization::OrganizationId, parse_id},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntegrationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub provider: ProviderKind,
    #[validate(length(min = 1))]
    pub client_id: String,
    #[validate(length(min = 1))]
    pub client_secret: String,
    pub scopes: Option<Vec<String>>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub state: String,
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct IntegrationIdRequest {
    pub integration_id: String,
}

/// Integration view. The client secret never leaves the server.
#[derive(Debug, Serialize)]
pub struct IntegrationResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub provider: ProviderKind,
    pub scopes: Vec<String>,
    pub last_synced_at: Option<String>,
    pub created_at: String,
}

impl From<Integration> for IntegrationResponse {
    fn from(i: Integration) -> Self {
        Self {
            id: i.id.map(|id| id.to_hex()).unwrap_or_default(),
            organization_id: i.organization_id.to_hex(),
            name: i.name,
            provider: i.provider,
            scopes: i.scopes,
            last_synced_at: i.last_synced_at.map(rfc3339),
            created_at: rfc3339(i.created_at),
        }
    }
}

/// Credential status. The refresh token is never returned.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub integration_id: String,
    pub access_token: String,
    pub expires_at: Option<String>,
    pub scope: Option<String>,
    pub has_refresh_token: bool,
    pub version: i64,
}

impl From<Credential> for CredentialResponse {
    fn from(c: Credential) -> Self {
        Self {
            has_refresh_token: c.usable_refresh_token().is_some(),
            integration_id: c.integration_id.to_hex(),
            access_token: c.access_token,
            expires_at: c.expires_at.map(rfc3339),
            scope: c.scope,
            version: c.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub url: String,
}

/// GET /api/organization/{organization_id}/integration
pub async fn list(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    OrganizationId(organization_id): OrganizationId,
) -> Result<Json<Vec<IntegrationResponse>>, ApiError> {
    let session = auth.map(|a| a.session());
    let integrations = state
        .integrations
        .list(session.as_ref(), organization_id)
        .await?;

    Ok(Json(integrations.into_iter().map(Into::into).collect()))
}

/// POST /api/organization/{organization_id}/integration
pub async fn create(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    OrganizationId(organization_id): OrganizationId,
    Json(body): Json<CreateIntegrationRequest>,
) -> Result<(StatusCode, Json<IntegrationResponse>), ApiError> {
    body.validate()?;
    let session = auth.map(|a| a.session());

    let integration = state
        .integrations
        .create(
            session.as_ref(),
            organization_id,
            NewIntegration {
                name: body.name,
                provider: body.provider,
                client_id: body.client_id,
                client_secret: body.client_secret,
                scopes: body.scopes,
                authorize_url: body.authorize_url,
                token_url: body.token_url,
                api_base_url: body.api_base_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(integration.into())))
}

/// DELETE /api/organization/{organization_id}/integration/{integration_id}
pub async fn remove(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((organization_id, integration_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let oid = parse_id(&organization_id, "organization_id")?;
    let iid = parse_id(&integration_id, "integration_id")?;
    let session = auth.map(|a| a.session());

    state
        .integrations
        .remove(session.as_ref(), oid, iid)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/integration/{integration_id}/authorize?redirect_uri=
pub async fn authorize(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(integration_id): Path<String>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    let iid = parse_id(&integration_id, "integration_id")?;

    let url = state
        .credentials
        .authorization_url(iid, auth.user_id, &query.redirect_uri)
        .await?;

    Ok(Json(AuthorizeResponse { url }))
}

/// POST /api/integration/callback
pub async fn callback(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CallbackRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let credential = state
        .credentials
        .complete_authorization(auth.user_id, &body.state, &body.code, &body.redirect_uri)
        .await?;

    Ok(Json(credential.into()))
}

/// POST /api/integration/refresh
pub async fn refresh(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<IntegrationIdRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let iid = parse_id(&body.integration_id, "integration_id")?;

    let credential = state.credentials.refresh(iid, auth.user_id).await?;

    Ok(Json(credential.into()))
}

/// POST /api/integration/sync
pub async fn sync(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<IntegrationIdRequest>,
) -> Result<Json<SyncReport>, ApiError> {
    let iid = parse_id(&body.integration_id, "integration_id")?;

    let report = state.sync.sync(iid, auth.user_id).await?;

    Ok(Json(report))
}

/// DELETE /api/integration/{integration_id}/credential
pub async fn disconnect(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(integration_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let iid = parse_id(&integration_id, "integration_id")?;

    state.credentials.disconnect(iid, auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use gatehouse_db::models::{Integration, ProviderKind};
use tracing::info;

use crate::access::Authorizer;
use crate::auth::Session;
use crate::error::{AccessError, AccessResult, Entity};
use crate::store::{CredentialStore, IntegrationStore, ResourceStore, Stores};

/// Input for a new integration. Endpoint URLs and scopes fall back to the
/// provider's public defaults.
#[derive(Debug, Clone)]
pub struct NewIntegration {
    pub name: String,
    pub provider: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Option<Vec<String>>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub api_base_url: Option<String>,
}

pub struct IntegrationService {
    authorizer: Authorizer,
    integrations: Arc<dyn IntegrationStore>,
    credentials: Arc<dyn CredentialStore>,
    resources: Arc<dyn ResourceStore>,
}

impl IntegrationService {
    pub fn new(authorizer: Authorizer, stores: &Stores) -> Self {
        Self {
            authorizer,
            integrations: stores.integrations.clone(),
            credentials: stores.credentials.clone(),
            resources: stores.resources.clone(),
        }
    }

    pub async fn create(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        input: NewIntegration,
    ) -> AccessResult<Integration> {
        let owner = self
            .authorizer
            .require_owner(session, organization_id)
            .await?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AccessError::InvalidInput("name"));
        }
        if input.client_id.trim().is_empty() {
            return Err(AccessError::InvalidInput("client_id"));
        }
        if input.client_secret.is_empty() {
            return Err(AccessError::InvalidInput("client_secret"));
        }

        let provider = input.provider;
        let authorize_url = endpoint(
            input.authorize_url,
            provider.default_authorize_url(),
            "authorize_url",
        )?;
        let token_url = endpoint(input.token_url, provider.default_token_url(), "token_url")?;
        let api_base_url = endpoint(
            input.api_base_url,
            provider.default_api_base_url(),
            "api_base_url",
        )?;

        let now = DateTime::now();
        let integration = self
            .integrations
            .insert_integration(Integration {
                id: None,
                organization_id,
                name,
                provider,
                authorize_url,
                token_url,
                api_base_url,
                client_id: input.client_id.trim().to_string(),
                client_secret: input.client_secret,
                scopes: input.scopes.unwrap_or_else(|| provider.default_scopes()),
                last_synced_at: None,
                created_by: owner.user_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            %organization_id,
            integration_id = ?integration.id,
            provider = provider.as_str(),
            "Integration created"
        );
        Ok(integration)
    }

    pub async fn list(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
    ) -> AccessResult<Vec<Integration>> {
        self.authorizer
            .require_member(session, organization_id)
            .await?;
        Ok(self.integrations.list_integrations(organization_id).await?)
    }

    /// Deletes the integration together with every credential and resource
    /// that belongs to it.
    pub async fn remove(
        &self,
        session: Option<&Session>,
        organization_id: ObjectId,
        integration_id: ObjectId,
    ) -> AccessResult<()> {
        self.authorizer
            .require_owner(session, organization_id)
            .await?;
        self.integrations
            .find_integration(integration_id)
            .await?
            .filter(|i| i.organization_id == organization_id)
            .ok_or(AccessError::NotFound(Entity::Integration))?;

        let credentials = self
            .credentials
            .delete_integration_credentials(integration_id)
            .await?;
        let resources = self
            .resources
            .delete_integration_resources(integration_id)
            .await?;
        self.integrations.delete_integration(integration_id).await?;

        info!(
            %organization_id,
            %integration_id,
            credentials,
            resources,
            "Integration removed"
        );
        Ok(())
    }
}

fn endpoint(
    value: Option<String>,
    default: &str,
    field: &'static str,
) -> AccessResult<String> {
    let url = value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string());
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url)
    } else {
        Err(AccessError::InvalidInput(field))
    }
}

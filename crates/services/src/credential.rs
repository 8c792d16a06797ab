use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use dashmap::DashMap;
use gatehouse_db::models::{Credential, Integration};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dao::base::DaoError;
use crate::error::{AccessError, AccessResult, Entity, ForbiddenReason};
use crate::oauth::{OAuthClient, StateSigner};
use crate::store::{CredentialStore, IntegrationStore, MemberStore, Stores};

type CredentialKey = (ObjectId, ObjectId);

/// Owns the OAuth token lifecycle of every (user, integration) pair:
/// initial authorization, refresh, expiry checks and disconnect.
pub struct CredentialService {
    integrations: Arc<dyn IntegrationStore>,
    members: Arc<dyn MemberStore>,
    credentials: Arc<dyn CredentialStore>,
    oauth: OAuthClient,
    state_signer: StateSigner,
    refresh_skew_secs: i64,
    refresh_locks: DashMap<CredentialKey, Arc<Mutex<()>>>,
}

impl CredentialService {
    pub fn new(
        stores: &Stores,
        oauth: OAuthClient,
        state_signer: StateSigner,
        refresh_skew_secs: i64,
    ) -> Self {
        Self {
            integrations: stores.integrations.clone(),
            members: stores.members.clone(),
            credentials: stores.credentials.clone(),
            oauth,
            state_signer,
            refresh_skew_secs,
            refresh_locks: DashMap::new(),
        }
    }

    /// Loads the integration and checks `user_id` belongs to its organization.
    pub async fn integration_for_member(
        &self,
        integration_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<Integration> {
        let integration = self
            .integrations
            .find_integration(integration_id)
            .await?
            .ok_or(AccessError::NotFound(Entity::Integration))?;

        self.members
            .find_member(integration.organization_id, user_id)
            .await?
            .ok_or(AccessError::Forbidden(ForbiddenReason::CrossTenant))?;

        Ok(integration)
    }

    pub async fn credential(
        &self,
        integration_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<Credential> {
        self.credentials
            .find_credential(user_id, integration_id)
            .await?
            .ok_or(AccessError::NotFound(Entity::Credential))
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Refreshes of the same pair are serialized in-process; a refresh that
    /// waited behind another one returns that result instead of spending the
    /// refresh token again. Across processes the write is conditional on the
    /// credential version that was read.
    pub async fn refresh(
        &self,
        integration_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<Credential> {
        let integration = self.integration_for_member(integration_id, user_id).await?;
        let seen_version = self
            .credentials
            .find_credential(user_id, integration_id)
            .await?
            .map(|c| c.version);

        let key = (user_id, integration_id);
        let lock = self
            .refresh_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.refresh_locked(&integration, user_id, seen_version).await
        };

        drop(lock);
        self.refresh_locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn refresh_locked(
        &self,
        integration: &Integration,
        user_id: ObjectId,
        seen_version: Option<i64>,
    ) -> AccessResult<Credential> {
        let integration_id = integration.id.ok_or(AccessError::NotFound(Entity::Integration))?;
        let current = self
            .credentials
            .find_credential(user_id, integration_id)
            .await?
            .ok_or(AccessError::NoRefreshToken)?;

        if seen_version.is_some_and(|v| v != current.version) {
            debug!(
                %user_id,
                %integration_id,
                version = current.version,
                "Credential refreshed while waiting; reusing it"
            );
            return Ok(current);
        }

        let refresh_token = current
            .usable_refresh_token()
            .ok_or(AccessError::NoRefreshToken)?;

        let response = self
            .oauth
            .refresh(integration, refresh_token)
            .await
            .map_err(|e| {
                warn!(
                    %user_id,
                    %integration_id,
                    provider = integration.provider.as_str(),
                    error = %e,
                    "Token refresh failed"
                );
                AccessError::RefreshFailed(e.to_string())
            })?;

        let tokens = response.into_token_set(
            DateTime::now(),
            current.usable_refresh_token().map(str::to_string),
        );

        match self
            .credentials
            .replace_if_version(user_id, integration_id, current.version, &tokens)
            .await
        {
            Ok(updated) => {
                info!(
                    %user_id,
                    %integration_id,
                    version = updated.version,
                    expires_at = ?updated.expires_at,
                    "Credential refreshed"
                );
                Ok(updated)
            }
            Err(DaoError::Conflict) => {
                warn!(
                    %user_id,
                    %integration_id,
                    "Concurrent credential write won; keeping the newer credential"
                );
                self.credentials
                    .find_credential(user_id, integration_id)
                    .await?
                    .ok_or(AccessError::NoRefreshToken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns an access token that is not about to expire, refreshing first
    /// when needed.
    pub async fn access_token(
        &self,
        integration_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<String> {
        self.integration_for_member(integration_id, user_id).await?;
        let credential = self
            .credentials
            .find_credential(user_id, integration_id)
            .await?
            .ok_or(AccessError::NoRefreshToken)?;

        if !credential.expires_within(DateTime::now(), self.refresh_skew_secs) {
            return Ok(credential.access_token);
        }

        debug!(%user_id, %integration_id, "Access token expiring; refreshing");
        Ok(self.refresh(integration_id, user_id).await?.access_token)
    }

    /// Consent-screen URL for connecting `user_id` to the integration.
    pub async fn authorization_url(
        &self,
        integration_id: ObjectId,
        user_id: ObjectId,
        redirect_uri: &str,
    ) -> AccessResult<String> {
        validate_redirect_uri(redirect_uri)?;
        let integration = self.integration_for_member(integration_id, user_id).await?;
        let state = self.state_signer.sign(user_id, integration_id);
        Ok(OAuthClient::authorize_url(&integration, redirect_uri, &state))
    }

    /// Finishes the consent flow: verifies `state`, exchanges `code` and
    /// stores the resulting credential.
    pub async fn complete_authorization(
        &self,
        user_id: ObjectId,
        state: &str,
        code: &str,
        redirect_uri: &str,
    ) -> AccessResult<Credential> {
        let (state_user, integration_id) = self
            .state_signer
            .verify(state)
            .ok_or(AccessError::InvalidInput("state"))?;
        if state_user != user_id {
            return Err(AccessError::InvalidInput("state"));
        }
        if code.trim().is_empty() {
            return Err(AccessError::InvalidInput("code"));
        }
        validate_redirect_uri(redirect_uri)?;

        let integration = self.integration_for_member(integration_id, user_id).await?;
        let response = self
            .oauth
            .exchange_code(&integration, code, redirect_uri)
            .await
            .map_err(|e| {
                warn!(%user_id, %integration_id, error = %e, "Code exchange failed");
                AccessError::RefreshFailed(e.to_string())
            })?;

        // Providers may omit the refresh token on re-consent.
        let previous_refresh = self
            .credentials
            .find_credential(user_id, integration_id)
            .await?
            .and_then(|c| c.usable_refresh_token().map(str::to_string));
        let tokens = response.into_token_set(DateTime::now(), previous_refresh);

        let credential = self
            .credentials
            .upsert_credential(user_id, integration_id, &tokens)
            .await?;

        info!(
            %user_id,
            %integration_id,
            provider = integration.provider.as_str(),
            "Integration authorized"
        );
        Ok(credential)
    }

    pub async fn disconnect(&self, integration_id: ObjectId, user_id: ObjectId) -> AccessResult<()> {
        self.integration_for_member(integration_id, user_id).await?;
        if !self
            .credentials
            .delete_credential(user_id, integration_id)
            .await?
        {
            return Err(AccessError::NotFound(Entity::Credential));
        }
        info!(%user_id, %integration_id, "Credential removed");
        Ok(())
    }
}

fn validate_redirect_uri(redirect_uri: &str) -> AccessResult<()> {
    if redirect_uri.starts_with("https://") || redirect_uri.starts_with("http://") {
        Ok(())
    } else {
        Err(AccessError::InvalidInput("redirect_uri"))
    }
}

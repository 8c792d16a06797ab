use std::sync::Arc;

use gatehouse_config::Settings;
use gatehouse_services::{
    AuthService, Authorizer, CredentialService, GroupAdminService, IntegrationService,
    MemberAdminService, OAuthClient, OrganizationService, PermissionResolver, StateSigner,
    Stores, SyncService, oauth::http_client,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub stores: Stores,
    pub authorizer: Authorizer,
    pub resolver: PermissionResolver,
    pub admin: Arc<MemberAdminService>,
    pub groups: Arc<GroupAdminService>,
    pub organizations: Arc<OrganizationService>,
    pub integrations: Arc<IntegrationService>,
    pub credentials: Arc<CredentialService>,
    pub sync: Arc<SyncService>,
}

impl AppState {
    pub fn new(stores: Stores, settings: Settings) -> anyhow::Result<Self> {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let authorizer = Authorizer::new(&stores);
        let resolver = PermissionResolver::new(&stores);

        let client = http_client(settings.oauth.http_timeout_secs)?;
        let state_signer = StateSigner::new(&settings.oauth.state_secret)
            .map_err(|e| anyhow::anyhow!("invalid oauth.state_secret: {}", e))?;
        let credentials = Arc::new(CredentialService::new(
            &stores,
            OAuthClient::new(client.clone()),
            state_signer,
            settings.oauth.refresh_skew_secs,
        ));
        let sync = Arc::new(SyncService::new(
            credentials.clone(),
            &stores,
            client,
            &settings.sync,
        ));

        Ok(Self {
            admin: Arc::new(MemberAdminService::new(authorizer.clone(), &stores)),
            groups: Arc::new(GroupAdminService::new(authorizer.clone(), &stores)),
            organizations: Arc::new(OrganizationService::new(authorizer.clone(), &stores)),
            integrations: Arc::new(IntegrationService::new(authorizer.clone(), &stores)),
            settings,
            auth,
            stores,
            authorizer,
            resolver,
            credentials,
            sync,
        })
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub oauth: OAuthSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

/// Outbound OAuth behaviour shared by every integration.
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthSettings {
    /// Upper bound for any token-endpoint or provider call.
    pub http_timeout_secs: u64,
    /// A stored token expiring within this window is refreshed before use.
    pub refresh_skew_secs: i64,
    /// Key for signing the `state` parameter of the consent redirect.
    pub state_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    pub max_pages: u32,
    pub page_size: u32,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("GATEHOUSE"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("database.backend", "mongo")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "gatehouse")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.issuer", "gatehouse")?
            .set_default("oauth.http_timeout_secs", 15)?
            .set_default("oauth.refresh_skew_secs", 60)?
            .set_default("oauth.state_secret", "change-me-in-production")?
            .set_default("sync.max_pages", 50)?
            .set_default("sync.page_size", 100)?
            .build()?;

        config.try_deserialize()
    }
}

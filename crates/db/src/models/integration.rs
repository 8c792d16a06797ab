use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Notion,
    GoogleDrive,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Notion => "notion",
            ProviderKind::GoogleDrive => "google_drive",
        }
    }

    pub fn default_authorize_url(&self) -> &'static str {
        match self {
            ProviderKind::Notion => "https://api.notion.com/v1/oauth/authorize",
            ProviderKind::GoogleDrive => "https://accounts.google.com/o/oauth2/v2/auth",
        }
    }

    pub fn default_token_url(&self) -> &'static str {
        match self {
            ProviderKind::Notion => "https://api.notion.com/v1/oauth/token",
            ProviderKind::GoogleDrive => "https://oauth2.googleapis.com/token",
        }
    }

    pub fn default_api_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Notion => "https://api.notion.com",
            ProviderKind::GoogleDrive => "https://www.googleapis.com",
        }
    }

    pub fn default_scopes(&self) -> Vec<String> {
        match self {
            ProviderKind::Notion => Vec::new(),
            ProviderKind::GoogleDrive => {
                vec!["https://www.googleapis.com/auth/drive.readonly".to_string()]
            }
        }
    }
}

/// A configured third-party connection owned by an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub name: String,
    pub provider: ProviderKind,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub last_synced_at: Option<DateTime>,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Integration {
    pub const COLLECTION: &'static str = "integrations";
}

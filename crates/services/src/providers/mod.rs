//! Third-party listing APIs normalized into [`ProviderItem`]s.

pub mod google_drive;
pub mod notion;

use async_trait::async_trait;
use gatehouse_db::models::{Integration, ProviderKind, ResourceKind};
use thiserror::Error;

const MAX_ERROR_BODY: usize = 200;

/// Where a listed item sits in the provider's hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// The provider reported no parent.
    Absent,
    /// The account's root folder.
    Root,
    /// The workspace itself.
    Workspace,
    /// Another item.
    Item(String),
    /// A parent shape this service does not understand.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderItem {
    pub id: String,
    pub parent: ParentRef,
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderPage {
    pub items: Vec<ProviderItem>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider timed out")]
    Timeout,
    #[error("provider unreachable: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Turns a non-2xx listing response into a `ProviderError::Api`.
pub(crate) async fn api_error(resp: reqwest::Response) -> ProviderError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("unknown error").to_string(),
        text => text.chars().take(MAX_ERROR_BODY).collect(),
    };
    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Kind assigned to every resource this provider lists.
    fn resource_kind(&self) -> ResourceKind;

    /// Whether `item` belongs in the synced set.
    fn is_top_level(&self, item: &ProviderItem) -> bool;

    async fn list_page(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<ProviderPage, ProviderError>;
}

pub fn provider_for(
    integration: &Integration,
    client: reqwest::Client,
    page_size: u32,
) -> Box<dyn ResourceProvider> {
    let api_base = integration.api_base_url.trim_end_matches('/').to_string();
    match integration.provider {
        ProviderKind::Notion => Box::new(notion::NotionProvider::new(client, api_base, page_size)),
        ProviderKind::GoogleDrive => Box::new(google_drive::GoogleDriveProvider::new(
            client, api_base, page_size,
        )),
    }
}

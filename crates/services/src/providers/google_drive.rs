use async_trait::async_trait;
use gatehouse_db::models::{ProviderKind, ResourceKind};
use reqwest::Client;
use serde::Deserialize;

use super::{ParentRef, ProviderError, ProviderItem, ProviderPage, ResourceProvider, api_error};

const ROOT_QUERY: &str = "'root' in parents and trashed = false";
const FIELDS: &str = "nextPageToken,files(id,name,parents,webViewLink)";
const MAX_PAGE_SIZE: u32 = 1000;

pub struct GoogleDriveProvider {
    client: Client,
    api_base: String,
    page_size: u32,
}

impl GoogleDriveProvider {
    pub fn new(client: Client, api_base: String, page_size: u32) -> Self {
        Self {
            client,
            api_base,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl From<DriveFile> for ProviderItem {
    fn from(file: DriveFile) -> Self {
        // The listing query only returns children of the root folder, whose
        // real id Drive reports instead of the `root` alias.
        let parent = if file.parents.is_empty() {
            ParentRef::Absent
        } else {
            ParentRef::Root
        };
        ProviderItem {
            id: file.id,
            parent,
            title: file
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            url: file.web_view_link,
        }
    }
}

#[async_trait]
impl ResourceProvider for GoogleDriveProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::GoogleDrive
    }

    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::File
    }

    fn is_top_level(&self, item: &ProviderItem) -> bool {
        matches!(item.parent, ParentRef::Root | ParentRef::Absent)
    }

    async fn list_page(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<ProviderPage, ProviderError> {
        let page_size = self.page_size.to_string();
        let mut query = vec![
            ("q", ROOT_QUERY),
            ("fields", FIELDS),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("pageToken", cursor));
        }

        let resp = self
            .client
            .get(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let list = resp.json::<FileList>().await?;
        Ok(ProviderPage {
            items: list.files.into_iter().map(ProviderItem::from).collect(),
            next_cursor: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

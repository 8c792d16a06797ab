use std::collections::HashMap;

use async_trait::async_trait;
use gatehouse_db::models::{ProviderKind, ResourceKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ParentRef, ProviderError, ProviderItem, ProviderPage, ResourceProvider, api_error};

const NOTION_VERSION: &str = "2022-06-28";
const MAX_PAGE_SIZE: u32 = 100;

pub struct NotionProvider {
    client: Client,
    api_base: String,
    page_size: u32,
}

impl NotionProvider {
    pub fn new(client: Client, api_base: String, page_size: u32) -> Self {
        Self {
            client,
            api_base,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<NotionObject>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "object", rename_all = "snake_case")]
enum NotionObject {
    Page {
        id: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        parent: Option<NotionParent>,
        #[serde(default)]
        properties: HashMap<String, NotionProperty>,
    },
    Database {
        id: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        parent: Option<NotionParent>,
        #[serde(default)]
        title: Vec<RichText>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NotionParent {
    Workspace,
    PageId { page_id: String },
    DatabaseId { database_id: String },
    BlockId { block_id: String },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NotionProperty {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
}

fn plain_text(parts: &[RichText]) -> Option<String> {
    let text: String = parts.iter().map(|p| p.plain_text.as_str()).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl From<Option<NotionParent>> for ParentRef {
    fn from(parent: Option<NotionParent>) -> Self {
        match parent {
            None => ParentRef::Absent,
            Some(NotionParent::Workspace) => ParentRef::Workspace,
            Some(NotionParent::PageId { page_id }) => ParentRef::Item(page_id),
            Some(NotionParent::DatabaseId { database_id }) => ParentRef::Item(database_id),
            Some(NotionParent::BlockId { block_id }) => ParentRef::Item(block_id),
            Some(NotionParent::Unknown) => ParentRef::Unrecognized,
        }
    }
}

impl NotionObject {
    fn into_item(self) -> Option<ProviderItem> {
        match self {
            NotionObject::Page {
                id,
                url,
                parent,
                properties,
            } => {
                let title = properties.into_values().find_map(|p| match p {
                    NotionProperty::Title { title } => plain_text(&title),
                    NotionProperty::Other => None,
                });
                Some(ProviderItem {
                    id,
                    parent: parent.into(),
                    title,
                    url,
                })
            }
            NotionObject::Database {
                id,
                url,
                parent,
                title,
            } => Some(ProviderItem {
                id,
                parent: parent.into(),
                title: plain_text(&title),
                url,
            }),
            NotionObject::Unsupported => None,
        }
    }
}

fn decode_search(body: SearchResponse) -> ProviderPage {
    ProviderPage {
        items: body
            .results
            .into_iter()
            .filter_map(NotionObject::into_item)
            .collect(),
        next_cursor: if body.has_more { body.next_cursor } else { None },
    }
}

#[async_trait]
impl ResourceProvider for NotionProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Notion
    }

    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::Document
    }

    fn is_top_level(&self, item: &ProviderItem) -> bool {
        matches!(item.parent, ParentRef::Workspace | ParentRef::Absent)
    }

    async fn list_page(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<ProviderPage, ProviderError> {
        let mut body = json!({ "page_size": self.page_size });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let resp = self
            .client
            .post(format!("{}/v1/search", self.api_base))
            .bearer_auth(access_token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        Ok(decode_search(resp.json::<SearchResponse>().await?))
    }
}

//! Notion reading-list client.
//!
//! Appends one page to a fixed database for each story an editor marks as
//! noteworthy.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use crate::config::NotionConfig;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Notion API key or database id is not configured")]
    NotConfigured,
    #[error("Notion transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notion returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Entry to append to the reading list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingListEntry {
    /// Goes to the `Name` title property
    pub title: String,
    /// Goes to the `URL` property
    pub url: Option<String>,
    /// Goes to the `Additional Info` rich text property
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    api_base: String,
    api_version: String,
    api_key: Option<String>,
    database_id: Option<String>,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, NotionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
        })
    }

    /// Creates a reading-list page and returns its Notion page id.
    pub async fn add_to_reading_list(&self, entry: &ReadingListEntry) -> Result<String, NotionError> {
        let (Some(api_key), Some(database_id)) = (&self.api_key, &self.database_id) else {
            return Err(NotionError::NotConfigured);
        };

        let body = json!({
            "parent": { "database_id": database_id },
            "properties": page_properties(entry),
        });

        let response = self
            .http
            .post(format!("{}/pages", self.api_base))
            .bearer_auth(api_key)
            .header("Notion-Version", &self.api_version)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let page: CreatedPage = response.json().await?;
        tracing::info!(page_id = %page.id, "Added story to Notion reading list");
        Ok(page.id)
    }
}

fn page_properties(entry: &ReadingListEntry) -> JsonValue {
    let mut properties = json!({
        "Name": { "title": [ { "text": { "content": entry.title } } ] }
    });

    if let Some(url) = entry.url.as_deref().filter(|u| !u.is_empty()) {
        properties["URL"] = json!({ "url": url });
    }
    if let Some(info) = entry.additional_info.as_deref().filter(|i| !i.is_empty()) {
        properties["Additional Info"] = json!({
            "rich_text": [ { "text": { "content": info } } ]
        });
    }

    properties
}

//! Pinecone vector index query client (HTTP data-plane API).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PineconeError {
    #[error("Pinecone transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Pinecone returned status {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: u32,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

/// One scored match from the index.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
}

#[derive(Debug, Clone)]
pub struct PineconeClient {
    http: reqwest::Client,
    api_key: String,
}

impl PineconeClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, PineconeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, api_key })
    }

    /// Queries `index_host` for the `top_k` nearest vectors, with metadata.
    pub async fn query(
        &self,
        index_host: &str,
        vector: &[f32],
        top_k: u32,
    ) -> Result<Vec<VectorMatch>, PineconeError> {
        let url = format!("{}/query", index_host.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .header("Api-Key", &self.api_key)
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata: true,
                include_values: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Pinecone query failed");
            return Err(PineconeError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: QueryResponse = response.json().await?;
        tracing::debug!(matches = parsed.matches.len(), "Pinecone query returned");
        Ok(parsed.matches)
    }
}

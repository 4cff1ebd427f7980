//! # Semantic catalog search
//!
//! Embeds the query with OpenAI, asks a Pinecone index for the nearest
//! vectors and maps the external ids in their metadata back to local rows.
//! A blank query skips the vector index and returns every visible row.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::config::SearchConfig;
use crate::integrations::openai::{OpenAIClient, OpenAIError};
use crate::integrations::pinecone::{PineconeClient, PineconeError, VectorMatch};
use crate::models::{n8n_template, tool};
use crate::repositories::n8n_template::TemplateRepository;
use crate::repositories::tool::ToolRepository;

/// Metadata key holding the tool external id in the tools index
pub const TOOL_ID_KEY: &str = "toolID";
/// Metadata key holding the template external id in the templates index
pub const TEMPLATE_ID_KEY: &str = "templateID";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search is not configured: missing {0}")]
    NotConfigured(&'static str),
    #[error("embedding failed: {0}")]
    Embedding(#[from] OpenAIError),
    #[error("vector index query failed: {0}")]
    Index(#[from] PineconeError),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// A catalog row with its similarity score (`None` for unranked results)
/// and the metadata stored alongside its vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<T> {
    pub item: T,
    pub relevance_score: Option<f64>,
    pub metadata: Map<String, JsonValue>,
}

/// External id extracted from one vector match
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
    pub external_id: String,
    pub score: f64,
    pub metadata: Map<String, JsonValue>,
}

#[derive(Debug, Clone)]
pub struct SearchService {
    embedder: Option<OpenAIClient>,
    index: Option<PineconeClient>,
    embedding_model: String,
    tools_index_host: Option<String>,
    templates_index_host: Option<String>,
    top_k: u32,
}

impl SearchService {
    /// Builds the service; missing credentials only fail at query time.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let timeout = Duration::from_secs(config.timeout_seconds);

        let embedder = match &config.openai_api_key {
            Some(key) => Some(OpenAIClient::new(key.clone(), &config.openai_api_base, timeout)?),
            None => None,
        };
        let index = match &config.pinecone_api_key {
            Some(key) => Some(PineconeClient::new(key.clone(), timeout)?),
            None => None,
        };

        Ok(Self {
            embedder,
            index,
            embedding_model: config.embedding_model.clone(),
            tools_index_host: config.tools_index_host.clone(),
            templates_index_host: config.templates_index_host.clone(),
            top_k: config.top_k,
        })
    }

    pub async fn search_tools(
        &self,
        repo: &ToolRepository,
        query: &str,
    ) -> Result<Vec<SearchHit<tool::Model>>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(unranked(repo.all_visible().await?));
        }

        let host = self
            .tools_index_host
            .as_deref()
            .ok_or(SearchError::NotConfigured("tools index host"))?;
        let scored = self.scored_external_ids(host, TOOL_ID_KEY, query).await?;
        let ids: Vec<String> = scored.iter().map(|s| s.external_id.clone()).collect();
        let rows = repo.find_visible_by_external_ids(&ids).await?;

        let hits = rank_by_scores(rows, |t| t.external_id.as_deref(), &scored);
        tracing::info!(matches = scored.len(), results = hits.len(), "Tool search completed");
        Ok(hits)
    }

    pub async fn search_templates(
        &self,
        repo: &TemplateRepository,
        query: &str,
    ) -> Result<Vec<SearchHit<n8n_template::Model>>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(unranked(repo.all_available().await?));
        }

        let host = self
            .templates_index_host
            .as_deref()
            .ok_or(SearchError::NotConfigured("templates index host"))?;
        let scored = self.scored_external_ids(host, TEMPLATE_ID_KEY, query).await?;
        let ids: Vec<String> = scored.iter().map(|s| s.external_id.clone()).collect();
        let rows = repo.find_available_by_external_ids(&ids).await?;

        let hits = rank_by_scores(rows, |t| t.external_id.as_deref(), &scored);
        tracing::info!(matches = scored.len(), results = hits.len(), "Template search completed");
        Ok(hits)
    }

    /// Embeds `query`, queries `index_host` and returns the matched external
    /// ids in descending score order, one entry per id.
    async fn scored_external_ids(
        &self,
        index_host: &str,
        id_key: &str,
        query: &str,
    ) -> Result<Vec<ScoredId>, SearchError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(SearchError::NotConfigured("OpenAI API key"))?;
        let index = self
            .index
            .as_ref()
            .ok_or(SearchError::NotConfigured("Pinecone API key"))?;

        let vector = embedder.create_embedding(query, &self.embedding_model).await?;
        let matches = index.query(index_host, &vector, self.top_k).await?;
        Ok(external_ids_from_matches(&matches, id_key))
    }
}

/// Reads and normalises external ids from match metadata, dropping matches
/// without a usable id and keeping only the best score per id.
pub fn external_ids_from_matches(matches: &[VectorMatch], id_key: &str) -> Vec<ScoredId> {
    let mut sorted: Vec<&VectorMatch> = matches.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter_map(|m| {
            let id = m.metadata.get(id_key).and_then(normalize_external_id);
            if id.is_none() {
                tracing::debug!(vector_id = %m.id, "Skipping match without external id");
            }
            id.map(|external_id| ScoredId {
                external_id,
                score: m.score,
                metadata: m.metadata.clone(),
            })
        })
        .filter(|scored| seen.insert(scored.external_id.clone()))
        .collect()
}

/// Canonical string form of an external id from index metadata.
///
/// Empty strings and `NaN` are not ids; integral floats such as `12.0`
/// become `"12"`.
pub fn normalize_external_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                return None;
            }
            match trimmed.parse::<f64>() {
                Ok(number) if number.is_finite() && number.fract() == 0.0 && trimmed.contains('.') => {
                    Some(format!("{}", number as i64))
                }
                _ => Some(trimmed.to_string()),
            }
        }
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else if let Some(float) = number.as_f64().filter(|f| f.is_finite()) {
                if float.fract() == 0.0 {
                    Some(format!("{}", float as i64))
                } else {
                    Some(float.to_string())
                }
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Orders `rows` by the score of their external id. Rows not in `scored`
/// are dropped, as are scored ids with no local row.
pub fn rank_by_scores<T, F>(rows: Vec<T>, external_id: F, scored: &[ScoredId]) -> Vec<SearchHit<T>>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut by_id: HashMap<String, T> = HashMap::new();
    for row in rows {
        if let Some(id) = external_id(&row).map(str::to_string) {
            by_id.entry(id).or_insert(row);
        }
    }

    scored
        .iter()
        .filter_map(|scored| {
            by_id.remove(&scored.external_id).map(|item| SearchHit {
                item,
                relevance_score: Some(scored.score),
                metadata: scored.metadata.clone(),
            })
        })
        .collect()
}

fn unranked<T>(rows: Vec<T>) -> Vec<SearchHit<T>> {
    rows.into_iter()
        .map(|item| SearchHit {
            item,
            relevance_score: None,
            metadata: Map::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vector_match(id: &str, score: f64, metadata: JsonValue) -> VectorMatch {
        VectorMatch {
            id: id.to_string(),
            score,
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn normalizes_external_ids() {
        assert_eq!(normalize_external_id(&json!("abc")), Some("abc".to_string()));
        assert_eq!(normalize_external_id(&json!(" 42 ")), Some("42".to_string()));
        assert_eq!(normalize_external_id(&json!("12.0")), Some("12".to_string()));
        assert_eq!(normalize_external_id(&json!(12.0)), Some("12".to_string()));
        assert_eq!(normalize_external_id(&json!(7)), Some("7".to_string()));
        assert_eq!(normalize_external_id(&json!("")), None);
        assert_eq!(normalize_external_id(&json!("NaN")), None);
        assert_eq!(normalize_external_id(&json!(null)), None);
        assert_eq!(normalize_external_id(&json!(["1"])), None);
    }

    #[test]
    fn external_ids_sorted_and_deduplicated() {
        let matches = vec![
            vector_match("a", 0.5, json!({"toolID": "1"})),
            vector_match("b", 0.9, json!({"toolID": 2.0})),
            vector_match("c", 0.7, json!({"other": "3"})),
            vector_match("d", 0.4, json!({"toolID": "1"})),
            vector_match("e", 0.8, json!({"toolID": "NaN"})),
        ];
        let ids: Vec<(String, f64)> = external_ids_from_matches(&matches, TOOL_ID_KEY)
            .into_iter()
            .map(|s| (s.external_id, s.score))
            .collect();
        assert_eq!(ids, vec![("2".to_string(), 0.9), ("1".to_string(), 0.5)]);
    }

    #[test]
    fn rank_drops_unknown_rows_and_ids() {
        let rows = vec![("x", Some("1")), ("y", Some("2")), ("z", None)];
        let scored: Vec<ScoredId> = [("2", 0.9), ("9", 0.8), ("1", 0.3)]
            .into_iter()
            .map(|(id, score)| ScoredId {
                external_id: id.to_string(),
                score,
                metadata: Map::new(),
            })
            .collect();
        let hits = rank_by_scores(rows, |row| row.1, &scored);
        let names: Vec<&str> = hits.iter().map(|hit| hit.item.0).collect();
        assert_eq!(names, vec!["y", "x"]);
        assert_eq!(hits[0].relevance_score, Some(0.9));
    }

    #[test]
    fn unranked_rows_have_no_score() {
        let hits = unranked(vec![1, 2, 3]);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|hit| hit.relevance_score.is_none()));
    }

    #[tokio::test]
    async fn unconfigured_search_reports_missing_host() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let repo = ToolRepository::new(std::sync::Arc::new(db));
        let service = SearchService::new(&SearchConfig::default()).unwrap();

        let err = service.search_tools(&repo, "agents").await.unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured("tools index host")));
    }
}

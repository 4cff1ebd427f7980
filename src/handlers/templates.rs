//! # Templates API Handlers
//!
//! n8n workflow templates. Only templates available on the website are
//! listed, fetched or searched.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, not_found};
use crate::handlers::tools::SearchRequest;
use crate::handlers::types::{PaginatedResponse, timestamp};
use crate::models::n8n_template;
use crate::pagination::{PageRequest, parse_ordering};
use crate::repositories::n8n_template::{ORDERING_FIELDS, TemplateRepository};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListTemplatesQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Case-insensitive match on name and description
    pub search: Option<String>,
    /// `name`, `score` or `created_at`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub download_url: String,
    pub external_id: Option<String>,
    pub score: f64,
    pub available_on_website: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<n8n_template::Model> for TemplateInfo {
    fn from(model: n8n_template::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            download_url: model.download_url,
            external_id: model.external_id,
            score: model.score,
            available_on_website: model.available_on_website,
            created_at: timestamp(&model.created_at),
            updated_at: timestamp(&model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateSearchResult {
    pub template: TemplateInfo,
    pub relevance_score: Option<f64>,
    #[schema(value_type = Object)]
    pub metadata: Map<String, JsonValue>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateSearchResponse {
    pub query: String,
    pub results: Vec<TemplateSearchResult>,
    pub total: usize,
}

#[utoipa::path(
    get,
    path = "/api/templates/",
    params(ListTemplatesQuery),
    responses(
        (status = 200, description = "Page of templates", body = PaginatedResponse<TemplateInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<PaginatedResponse<TemplateInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), ORDERING_FIELDS)?;

    let repo = TemplateRepository::new(Arc::new(state.db.clone()));
    let (templates, total) = repo.list(query.search.as_deref(), ordering, page).await?;

    Ok(Json(PaginatedResponse::new(
        templates.into_iter().map(TemplateInfo::from).collect(),
        total,
        page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/templates/{id}/",
    params(("id" = i32, Path, description = "Template id")),
    responses(
        (status = 200, description = "Template", body = TemplateInfo),
        (status = 404, description = "Template not found", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TemplateInfo>, ApiError> {
    let repo = TemplateRepository::new(Arc::new(state.db.clone()));
    repo.find_available(id)
        .await?
        .map(|template| Json(TemplateInfo::from(template)))
        .ok_or_else(|| not_found("Template"))
}

/// Semantic search over available templates
#[utoipa::path(
    post,
    path = "/api/templates/search/",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Templates in relevance order", body = TemplateSearchResponse),
        (status = 500, description = "Search backend failure", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn search_templates(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<TemplateSearchResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.query.unwrap_or_default().trim().to_string();

    let repo = TemplateRepository::new(Arc::new(state.db.clone()));
    let results: Vec<TemplateSearchResult> = state
        .search
        .search_templates(&repo, &query)
        .await?
        .into_iter()
        .map(|hit| TemplateSearchResult {
            template: TemplateInfo::from(hit.item),
            relevance_score: hit.relevance_score,
            metadata: hit.metadata,
        })
        .collect();

    Ok(Json(TemplateSearchResponse {
        query,
        total: results.len(),
        results,
    }))
}

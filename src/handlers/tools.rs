//! # Tools API Handlers
//!
//! Public catalog listing, detail, categories and semantic search, plus the
//! admin-only manual reorder action.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AdminAuth;
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, timestamp};
use crate::models::{category, tool};
use crate::pagination::{PageRequest, parse_ordering};
use crate::repositories::tool::{ORDERING_FIELDS, ToolFilter, ToolRepository};
use crate::search::SearchHit;
use crate::server::AppState;

/// Query parameters for the tools listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListToolsQuery {
    /// 1-based page number (default: 1)
    pub page: Option<u64>,
    /// Items per page (default: 20, max: 100)
    pub page_size: Option<u64>,
    /// Category id
    pub category: Option<i32>,
    /// One of `free`, `freemium`, `paid`, `enterprise`
    pub pricing: Option<String>,
    pub is_featured: Option<bool>,
    /// Case-insensitive match on name and description
    pub search: Option<String>,
    /// Comma separated fields, `-` prefix for descending
    /// (`table_order`, `rating`, `name`, `created_at`, `updated_at`)
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryInfo {
    pub id: i32,
    pub name: String,
}

impl From<category::Model> for CategoryInfo {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Tool information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Feature bullet points
    #[schema(value_type = Vec<String>)]
    pub features: JsonValue,
    #[schema(value_type = Vec<String>)]
    pub new_features: JsonValue,
    pub website_url: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_url: Option<String>,
    pub external_id: Option<String>,
    pub pricing: String,
    pub is_featured: bool,
    pub rating: Option<f64>,
    pub table_order: i32,
    /// ISO date (YYYY-MM-DD)
    pub date_added: Option<String>,
    pub last_updated: Option<String>,
    pub categories: Vec<CategoryInfo>,
    pub created_at: String,
    pub updated_at: String,
}

impl ToolInfo {
    fn from_model(model: tool::Model, categories: Vec<category::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            features: model.features,
            new_features: model.new_features,
            website_url: model.website_url,
            source_url: model.source_url,
            image_url: model.image_url,
            affiliate_url: model.affiliate_url,
            external_id: model.external_id,
            pricing: model.pricing,
            is_featured: model.is_featured,
            rating: model.rating,
            table_order: model.table_order,
            date_added: model.date_added.map(|d| d.to_string()),
            last_updated: model.last_updated.map(|d| d.to_string()),
            categories: categories.into_iter().map(CategoryInfo::from).collect(),
            created_at: timestamp(&model.created_at),
            updated_at: timestamp(&model.updated_at),
        }
    }
}

/// Attaches categories to each tool with one extra query.
async fn with_categories(
    repo: &ToolRepository,
    tools: Vec<tool::Model>,
) -> Result<Vec<ToolInfo>, ApiError> {
    let ids: Vec<i32> = tools.iter().map(|t| t.id).collect();
    let mut categories: HashMap<i32, Vec<category::Model>> = repo.categories_for(&ids).await?;

    Ok(tools
        .into_iter()
        .map(|tool| {
            let tool_categories = categories.remove(&tool.id).unwrap_or_default();
            ToolInfo::from_model(tool, tool_categories)
        })
        .collect())
}

/// Lists tools shown on the site
#[utoipa::path(
    get,
    path = "/api/tools/",
    params(ListToolsQuery),
    responses(
        (status = 200, description = "Page of tools", body = PaginatedResponse<ToolInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "tools"
)]
pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ListToolsQuery>,
) -> Result<Json<PaginatedResponse<ToolInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), ORDERING_FIELDS)?;

    if let Some(pricing) = query.pricing.as_deref()
        && !tool::PRICING_CHOICES.contains(&pricing)
    {
        return Err(validation_error(
            "Unsupported pricing filter",
            serde_json::json!({ "pricing": pricing, "allowed": tool::PRICING_CHOICES }),
        ));
    }

    let filter = ToolFilter {
        category: query.category,
        pricing: query.pricing,
        is_featured: query.is_featured,
        search: query.search,
    };

    let repo = ToolRepository::new(Arc::new(state.db.clone()));
    let (tools, total) = repo.list(&filter, ordering, page).await?;
    let results = with_categories(&repo, tools).await?;

    Ok(Json(PaginatedResponse::new(results, total, page)))
}

/// Returns one visible tool
#[utoipa::path(
    get,
    path = "/api/tools/{id}/",
    params(("id" = i32, Path, description = "Tool id")),
    responses(
        (status = 200, description = "Tool", body = ToolInfo),
        (status = 404, description = "Tool not found", body = ApiError)
    ),
    tag = "tools"
)]
pub async fn get_tool(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ToolInfo>, ApiError> {
    let repo = ToolRepository::new(Arc::new(state.db.clone()));
    let tool = repo.find_visible(id).await?.ok_or_else(|| not_found("Tool"))?;

    let mut tools = with_categories(&repo, vec![tool]).await?;
    tools.pop().map(Json).ok_or_else(|| not_found("Tool"))
}

/// Lists every tool category
#[utoipa::path(
    get,
    path = "/api/tools/categories/",
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryInfo>)
    ),
    tag = "tools"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryInfo>>, ApiError> {
    let repo = ToolRepository::new(Arc::new(state.db.clone()));
    let categories = repo.list_categories().await?;
    Ok(Json(categories.into_iter().map(CategoryInfo::from).collect()))
}

/// Free-text search request shared by the catalog search endpoints
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Blank or missing returns every visible row unranked
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolSearchResult {
    pub tool: ToolInfo,
    /// Vector similarity, null when no query was given
    pub relevance_score: Option<f64>,
    /// Metadata stored with the matched vector
    #[schema(value_type = Object)]
    pub metadata: Map<String, JsonValue>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolSearchResponse {
    pub query: String,
    pub results: Vec<ToolSearchResult>,
    pub total: usize,
}

/// Semantic search over the tools catalog
#[utoipa::path(
    post,
    path = "/api/tools/search/",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Tools in relevance order", body = ToolSearchResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 500, description = "Search backend failure", body = ApiError)
    ),
    tag = "tools"
)]
pub async fn search_tools(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ToolSearchResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.query.unwrap_or_default().trim().to_string();

    let repo = ToolRepository::new(Arc::new(state.db.clone()));
    let hits: Vec<SearchHit<tool::Model>> = state.search.search_tools(&repo, &query).await?;

    let (models, scores): (Vec<tool::Model>, Vec<(Option<f64>, Map<String, JsonValue>)>) = hits
        .into_iter()
        .map(|hit| (hit.item, (hit.relevance_score, hit.metadata)))
        .unzip();
    let tools = with_categories(&repo, models).await?;

    let results: Vec<ToolSearchResult> = tools
        .into_iter()
        .zip(scores)
        .map(|(tool, (relevance_score, metadata))| ToolSearchResult {
            tool,
            relevance_score,
            metadata,
        })
        .collect();

    Ok(Json(ToolSearchResponse {
        query,
        total: results.len(),
        results,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// Target 0-based position in the manual ordering
    pub position: usize,
}

/// Moves a tool to a new position, renumbering every tool's `table_order`
#[utoipa::path(
    post,
    path = "/api/tools/{id}/reorder/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool id")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Tool after the move", body = ToolInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Tool not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn reorder_tool(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<ToolInfo>, ApiError> {
    let Json(request) = payload?;

    let repo = ToolRepository::new(Arc::new(state.db.clone()));
    let tool = repo
        .reorder(id, request.position)
        .await?
        .ok_or_else(|| not_found("Tool"))?;

    tracing::info!(tool_id = id, position = tool.table_order, "Tool reordered");
    let mut tools = with_categories(&repo, vec![tool]).await?;
    tools.pop().map(Json).ok_or_else(|| not_found("Tool"))
}

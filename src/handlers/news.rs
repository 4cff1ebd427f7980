//! # News API Handlers
//!
//! Canonical and captured story CRUD, the public ranked feed, editorial
//! news articles and the admin action that sends a story to the Notion
//! reading list. Reads are public; every mutation requires an admin token.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AdminAuth;
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::required_field;
use crate::handlers::types::{PaginatedResponse, optional_timestamp, timestamp};
use crate::integrations::notion::ReadingListEntry;
use crate::models::{canonical_news_story, captured_news_story, news_article};
use crate::pagination::{PageRequest, parse_ordering};
use crate::repositories::news::{
    ARTICLE_ORDERING_FIELDS, ArticleFilter, CANONICAL_ORDERING_FIELDS, CAPTURED_ORDERING_FIELDS,
    CanonicalStoryInput, CapturedFilter, CapturedStoryInput, NewsRepository,
};
use crate::server::AppState;

const FEED_DEFAULT_PAGE_SIZE: u64 = 10;
const FEED_MAX_PAGE_SIZE: u64 = 50;
/// Notion rejects rich text blocks longer than this
const NOTION_TEXT_LIMIT: usize = 2000;

fn news_repo(state: &AppState) -> NewsRepository {
    NewsRepository::new(Arc::new(state.db.clone()))
}

// Canonical stories

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCanonicalQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Pipeline status, e.g. `ranked`
    pub status: Option<String>,
    /// Case-insensitive match on title and summary
    pub search: Option<String>,
    /// `created_at`, `event_time` or `rank`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CanonicalStoryInfo {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub event_time: Option<String>,
    pub rank: Option<i32>,
    pub status: Option<String>,
    pub is_noteworthy: bool,
    pub notion_page_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Number of captured stories linked to this story
    pub captured_stories_count: u64,
}

impl CanonicalStoryInfo {
    fn from_model(model: canonical_news_story::Model, captured_stories_count: u64) -> Self {
        Self {
            id: model.id,
            title: model.title,
            summary: model.summary,
            event_time: optional_timestamp(model.event_time.as_ref()),
            rank: model.rank,
            status: model.status,
            is_noteworthy: model.is_noteworthy,
            notion_page_id: model.notion_page_id,
            created_at: timestamp(&model.created_at),
            updated_at: timestamp(&model.updated_at),
            captured_stories_count,
        }
    }
}

/// Writable canonical story fields; updates replace every field
#[derive(Debug, Deserialize, ToSchema)]
pub struct CanonicalStoryRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    /// RFC 3339 timestamp
    #[schema(value_type = Option<String>)]
    pub event_time: Option<DateTimeWithTimeZone>,
    pub rank: Option<i32>,
    pub status: Option<String>,
}

impl CanonicalStoryRequest {
    fn into_input(self) -> Result<CanonicalStoryInput, ApiError> {
        Ok(CanonicalStoryInput {
            title: required_field(self.title, "Title")?,
            summary: self.summary.unwrap_or_default(),
            event_time: self.event_time,
            rank: self.rank,
            status: self
                .status
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

async fn with_counts(
    repo: &NewsRepository,
    stories: Vec<canonical_news_story::Model>,
) -> Result<Vec<CanonicalStoryInfo>, ApiError> {
    let ids: Vec<i32> = stories.iter().map(|s| s.id).collect();
    let counts = repo.captured_counts(&ids).await?;
    Ok(stories
        .into_iter()
        .map(|story| {
            let count = counts.get(&story.id).copied().unwrap_or(0);
            CanonicalStoryInfo::from_model(story, count)
        })
        .collect())
}

async fn canonical_info(
    repo: &NewsRepository,
    story: canonical_news_story::Model,
) -> Result<CanonicalStoryInfo, ApiError> {
    let count = repo
        .captured_counts(&[story.id])
        .await?
        .get(&story.id)
        .copied()
        .unwrap_or(0);
    Ok(CanonicalStoryInfo::from_model(story, count))
}

#[utoipa::path(
    get,
    path = "/api/news/canonical-stories/",
    params(ListCanonicalQuery),
    responses(
        (status = 200, description = "Page of canonical stories", body = PaginatedResponse<CanonicalStoryInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "news"
)]
pub async fn list_canonical_stories(
    State(state): State<AppState>,
    Query(query): Query<ListCanonicalQuery>,
) -> Result<Json<PaginatedResponse<CanonicalStoryInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), CANONICAL_ORDERING_FIELDS)?;

    let repo = news_repo(&state);
    let (stories, total) = repo
        .list_canonical(query.status.as_deref(), query.search.as_deref(), ordering, page)
        .await?;
    let results = with_counts(&repo, stories).await?;

    Ok(Json(PaginatedResponse::new(results, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/news/canonical-stories/{id}/",
    params(("id" = i32, Path, description = "Canonical story id")),
    responses(
        (status = 200, description = "Canonical story", body = CanonicalStoryInfo),
        (status = 404, description = "Story not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn get_canonical_story(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CanonicalStoryInfo>, ApiError> {
    let repo = news_repo(&state);
    let story = repo
        .find_canonical(id)
        .await?
        .ok_or_else(|| not_found("Canonical story"))?;
    Ok(Json(canonical_info(&repo, story).await?))
}

#[utoipa::path(
    post,
    path = "/api/news/canonical-stories/",
    security(("bearer_auth" = [])),
    request_body = CanonicalStoryRequest,
    responses(
        (status = 201, description = "Story created", body = CanonicalStoryInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "news"
)]
pub async fn create_canonical_story(
    State(state): State<AppState>,
    _admin: AdminAuth,
    payload: Result<Json<CanonicalStoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CanonicalStoryInfo>), ApiError> {
    let Json(request) = payload?;
    let input = request.into_input()?;

    let story = news_repo(&state).create_canonical(input).await?;
    tracing::info!(story_id = story.id, "Canonical story created");
    Ok((
        StatusCode::CREATED,
        Json(CanonicalStoryInfo::from_model(story, 0)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/news/canonical-stories/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Canonical story id")),
    request_body = CanonicalStoryRequest,
    responses(
        (status = 200, description = "Story updated", body = CanonicalStoryInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Story not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn update_canonical_story(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
    payload: Result<Json<CanonicalStoryRequest>, JsonRejection>,
) -> Result<Json<CanonicalStoryInfo>, ApiError> {
    let Json(request) = payload?;
    let input = request.into_input()?;

    let repo = news_repo(&state);
    let story = repo
        .update_canonical(id, input)
        .await?
        .ok_or_else(|| not_found("Canonical story"))?;
    Ok(Json(canonical_info(&repo, story).await?))
}

/// Deletes a story; linked captured stories are kept and unlinked
#[utoipa::path(
    delete,
    path = "/api/news/canonical-stories/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Canonical story id")),
    responses(
        (status = 204, description = "Story deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Story not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn delete_canonical_story(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if news_repo(&state).delete_canonical(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Canonical story"))
    }
}

/// Builds the reading-list entry: the first captured source becomes the URL,
/// the rest are listed under "Additional Info".
pub fn reading_list_entry(
    story: &canonical_news_story::Model,
    captured: &[captured_news_story::Model],
) -> ReadingListEntry {
    let mut sources = captured.iter().filter(|c| !c.url.trim().is_empty());
    let url = sources.next().map(|c| c.url.clone());

    let remaining: Vec<String> = sources
        .map(|c| format!("{}: {}", c.source, c.url))
        .collect();
    let additional_info = (!remaining.is_empty()).then(|| {
        let text = format!("Other sources:\n{}", remaining.join("\n"));
        text.chars().take(NOTION_TEXT_LIMIT).collect()
    });

    ReadingListEntry {
        title: story.title.chars().take(NOTION_TEXT_LIMIT).collect(),
        url,
        additional_info,
    }
}

/// Sends a story to the Notion reading list and flags it noteworthy.
/// Stories that already have a Notion page are returned unchanged.
#[utoipa::path(
    post,
    path = "/api/news/canonical-stories/{id}/noteworthy/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Canonical story id")),
    responses(
        (status = 200, description = "Story flagged noteworthy", body = CanonicalStoryInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Story not found", body = ApiError),
        (status = 500, description = "Notion request failed", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn mark_noteworthy(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<Json<CanonicalStoryInfo>, ApiError> {
    let repo = news_repo(&state);
    let story = repo
        .find_canonical(id)
        .await?
        .ok_or_else(|| not_found("Canonical story"))?;

    if story.is_noteworthy && story.notion_page_id.is_some() {
        tracing::info!(story_id = id, "Story already on the reading list");
        return Ok(Json(canonical_info(&repo, story).await?));
    }

    let captured = repo.captured_for(id).await?;
    let entry = reading_list_entry(&story, &captured);
    let page_id = state.notion.add_to_reading_list(&entry).await?;

    let story = repo.mark_noteworthy(story, page_id).await?;
    tracing::info!(story_id = id, sources = captured.len(), "Story added to reading list");
    Ok(Json(CanonicalStoryInfo::from_model(story, captured.len() as u64)))
}

// Captured stories

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCapturedQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub source: Option<String>,
    /// Canonical story id
    pub canonical_story: Option<i32>,
    /// Case-insensitive match on title, text and author
    pub search: Option<String>,
    /// `captured_at` or `published_date`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CapturedStoryInfo {
    pub id: i32,
    pub canonical_story: Option<i32>,
    pub canonical_story_title: Option<String>,
    pub title: String,
    pub text: String,
    pub url: String,
    pub source: String,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub captured_at: String,
}

impl CapturedStoryInfo {
    fn from_model(model: captured_news_story::Model, canonical_story_title: Option<String>) -> Self {
        Self {
            id: model.id,
            canonical_story: model.canonical_story_id,
            canonical_story_title,
            title: model.title,
            text: model.text,
            url: model.url,
            source: model.source,
            author: model.author,
            published_date: optional_timestamp(model.published_date.as_ref()),
            captured_at: timestamp(&model.captured_at),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CapturedStoryRequest {
    /// Canonical story id to link to
    pub canonical_story: Option<i32>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    #[schema(value_type = Option<String>)]
    pub published_date: Option<DateTimeWithTimeZone>,
}

impl CapturedStoryRequest {
    async fn into_input(self, repo: &NewsRepository) -> Result<CapturedStoryInput, ApiError> {
        let title = required_field(self.title, "Title")?;
        let url = required_field(self.url, "Url")?;
        let source = required_field(self.source, "Source")?;

        if let Some(canonical_id) = self.canonical_story
            && repo.find_canonical(canonical_id).await?.is_none()
        {
            return Err(validation_error(
                "Canonical story does not exist",
                serde_json::json!({ "canonical_story": canonical_id }),
            ));
        }

        Ok(CapturedStoryInput {
            canonical_story_id: self.canonical_story,
            title,
            text: self.text.unwrap_or_default(),
            url,
            source,
            author: self.author.filter(|a| !a.trim().is_empty()),
            published_date: self.published_date,
        })
    }
}

async fn with_titles(
    repo: &NewsRepository,
    stories: Vec<captured_news_story::Model>,
) -> Result<Vec<CapturedStoryInfo>, ApiError> {
    let mut ids: Vec<i32> = stories.iter().filter_map(|s| s.canonical_story_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let titles: HashMap<i32, String> = repo.canonical_titles(&ids).await?;

    Ok(stories
        .into_iter()
        .map(|story| {
            let title = story
                .canonical_story_id
                .and_then(|id| titles.get(&id).cloned());
            CapturedStoryInfo::from_model(story, title)
        })
        .collect())
}

async fn captured_info(
    repo: &NewsRepository,
    story: captured_news_story::Model,
) -> Result<CapturedStoryInfo, ApiError> {
    let mut infos = with_titles(repo, vec![story]).await?;
    infos.pop().ok_or_else(|| not_found("Captured story"))
}

#[utoipa::path(
    get,
    path = "/api/news/captured-stories/",
    params(ListCapturedQuery),
    responses(
        (status = 200, description = "Page of captured stories", body = PaginatedResponse<CapturedStoryInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "news"
)]
pub async fn list_captured_stories(
    State(state): State<AppState>,
    Query(query): Query<ListCapturedQuery>,
) -> Result<Json<PaginatedResponse<CapturedStoryInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), CAPTURED_ORDERING_FIELDS)?;
    let filter = CapturedFilter {
        source: query.source,
        canonical_story: query.canonical_story,
        search: query.search,
    };

    let repo = news_repo(&state);
    let (stories, total) = repo.list_captured(&filter, ordering, page).await?;
    let results = with_titles(&repo, stories).await?;

    Ok(Json(PaginatedResponse::new(results, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/news/captured-stories/{id}/",
    params(("id" = i32, Path, description = "Captured story id")),
    responses(
        (status = 200, description = "Captured story", body = CapturedStoryInfo),
        (status = 404, description = "Story not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn get_captured_story(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CapturedStoryInfo>, ApiError> {
    let repo = news_repo(&state);
    let story = repo
        .find_captured(id)
        .await?
        .ok_or_else(|| not_found("Captured story"))?;
    Ok(Json(captured_info(&repo, story).await?))
}

#[utoipa::path(
    post,
    path = "/api/news/captured-stories/",
    security(("bearer_auth" = [])),
    request_body = CapturedStoryRequest,
    responses(
        (status = 201, description = "Story created", body = CapturedStoryInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "news"
)]
pub async fn create_captured_story(
    State(state): State<AppState>,
    _admin: AdminAuth,
    payload: Result<Json<CapturedStoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CapturedStoryInfo>), ApiError> {
    let Json(request) = payload?;
    let repo = news_repo(&state);
    let input = request.into_input(&repo).await?;

    let story = repo.create_captured(input).await?;
    tracing::info!(story_id = story.id, source = %story.source, "Captured story created");
    Ok((StatusCode::CREATED, Json(captured_info(&repo, story).await?)))
}

#[utoipa::path(
    put,
    path = "/api/news/captured-stories/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Captured story id")),
    request_body = CapturedStoryRequest,
    responses(
        (status = 200, description = "Story updated", body = CapturedStoryInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Story not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn update_captured_story(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
    payload: Result<Json<CapturedStoryRequest>, JsonRejection>,
) -> Result<Json<CapturedStoryInfo>, ApiError> {
    let Json(request) = payload?;
    let repo = news_repo(&state);
    let input = request.into_input(&repo).await?;

    let story = repo
        .update_captured(id, input)
        .await?
        .ok_or_else(|| not_found("Captured story"))?;
    Ok(Json(captured_info(&repo, story).await?))
}

#[utoipa::path(
    delete,
    path = "/api/news/captured-stories/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Captured story id")),
    responses(
        (status = 204, description = "Story deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Story not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn delete_captured_story(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if news_repo(&state).delete_captured(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Captured story"))
    }
}

// Public feed

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct FeedQuery {
    /// 1-based page number (default: 1)
    pub page: Option<u64>,
    /// Items per page (default: 10, max: 50)
    #[serde(rename = "pageSize")]
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedItem {
    #[serde(flatten)]
    pub story: CanonicalStoryInfo,
    /// True when at least one captured source exists
    pub show_source: bool,
    /// URL of the most recently captured source
    pub source_url: Option<String>,
    pub source_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedResponse {
    pub data: Vec<FeedItem>,
    pub count: u64,
    pub page: u64,
    #[serde(rename = "pageSize")]
    pub page_size: u64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Ranked stories for the public news page, newest event first
#[utoipa::path(
    get,
    path = "/api/news/feed/",
    params(FeedQuery),
    responses(
        (status = 200, description = "Feed page", body = FeedResponse),
        (status = 400, description = "Invalid page or pageSize", body = ApiError)
    ),
    tag = "news"
)]
pub async fn news_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let page = PageRequest::with_limits(
        query.page,
        query.page_size,
        FEED_DEFAULT_PAGE_SIZE,
        FEED_MAX_PAGE_SIZE,
    )?;

    let repo = news_repo(&state);
    let (stories, total) = repo.feed(page).await?;

    let ids: Vec<i32> = stories.iter().map(|s| s.id).collect();
    let counts = repo.captured_counts(&ids).await?;
    let mut latest = repo.latest_captured_for(&ids).await?;

    let data = stories
        .into_iter()
        .map(|story| {
            let count = counts.get(&story.id).copied().unwrap_or(0);
            let source = latest.remove(&story.id);
            FeedItem {
                show_source: count > 0,
                source_url: source.as_ref().map(|s| s.url.clone()),
                source_name: source.map(|s| s.source),
                story: CanonicalStoryInfo::from_model(story, count),
            }
        })
        .collect();

    Ok(Json(FeedResponse {
        data,
        count: total,
        page: page.page,
        page_size: page.page_size,
        has_more: page.has_more(total),
    }))
}

// News articles

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListArticlesQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub category: Option<String>,
    pub is_featured: Option<bool>,
    /// Case-insensitive match on title and summary
    pub search: Option<String>,
    /// `published_at`, `title` or `created_at`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewsArticleInfo {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub url: Option<String>,
    pub published_at: String,
    pub is_featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<news_article::Model> for NewsArticleInfo {
    fn from(model: news_article::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            summary: model.summary,
            content: model.content,
            category: model.category,
            url: model.url,
            published_at: timestamp(&model.published_at),
            is_featured: model.is_featured,
            created_at: timestamp(&model.created_at),
            updated_at: timestamp(&model.updated_at),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/news/articles/",
    params(ListArticlesQuery),
    responses(
        (status = 200, description = "Page of news articles", body = PaginatedResponse<NewsArticleInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "news"
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<PaginatedResponse<NewsArticleInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), ARTICLE_ORDERING_FIELDS)?;
    let filter = ArticleFilter {
        category: query.category,
        is_featured: query.is_featured,
        search: query.search,
    };

    let (articles, total) = news_repo(&state)
        .list_articles(&filter, ordering, page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        articles.into_iter().map(NewsArticleInfo::from).collect(),
        total,
        page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/news/articles/{id}/",
    params(("id" = i32, Path, description = "Article id")),
    responses(
        (status = 200, description = "News article", body = NewsArticleInfo),
        (status = 404, description = "Article not found", body = ApiError)
    ),
    tag = "news"
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NewsArticleInfo>, ApiError> {
    news_repo(&state)
        .find_article(id)
        .await?
        .map(|article| Json(NewsArticleInfo::from(article)))
        .ok_or_else(|| not_found("News article"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn story() -> canonical_news_story::Model {
        let now = Utc::now().fixed_offset();
        canonical_news_story::Model {
            id: 7,
            title: "Model release".to_string(),
            summary: String::new(),
            event_time: None,
            rank: Some(3),
            status: Some("ranked".to_string()),
            is_noteworthy: false,
            notion_page_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn captured(id: i32, source: &str, url: &str) -> captured_news_story::Model {
        captured_news_story::Model {
            id,
            canonical_story_id: Some(7),
            title: format!("capture {}", id),
            text: String::new(),
            url: url.to_string(),
            source: source.to_string(),
            author: None,
            published_date: None,
            captured_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn reading_list_entry_uses_first_source_as_url() {
        let entry = reading_list_entry(
            &story(),
            &[
                captured(1, "techcrunch", "https://tc.example/a"),
                captured(2, "verge", "https://verge.example/b"),
                captured(3, "wired", "https://wired.example/c"),
            ],
        );

        assert_eq!(entry.title, "Model release");
        assert_eq!(entry.url.as_deref(), Some("https://tc.example/a"));
        let info = entry.additional_info.unwrap();
        assert!(info.contains("verge: https://verge.example/b"));
        assert!(info.contains("wired: https://wired.example/c"));
        assert!(!info.contains("techcrunch"));
    }

    #[test]
    fn reading_list_entry_without_sources() {
        let entry = reading_list_entry(&story(), &[]);
        assert_eq!(entry.url, None);
        assert_eq!(entry.additional_info, None);

        let single = reading_list_entry(&story(), &[captured(1, "tc", "https://tc.example/a")]);
        assert_eq!(single.url.as_deref(), Some("https://tc.example/a"));
        assert_eq!(single.additional_info, None);
    }
}

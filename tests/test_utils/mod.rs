//! Test utilities for database and router testing.
//!
//! Sets up in-memory SQLite databases with migrations applied, fixture rows
//! and an application router wired to mock upstream services.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use applied_ai::config::AppConfig;
use applied_ai::server::{AppState, create_app};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

use applied_ai::models::{
    canonical_news_story, captured_news_story, category, landing_page, n8n_template, tool,
    tool_category,
};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const UPLOAD_TOKEN: &str = "test-upload-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Configuration for the `test` profile with one admin and one upload token.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig {
        profile: "test".to_string(),
        admin_tokens: vec![ADMIN_TOKEN.to_string()],
        ..AppConfig::default()
    };
    config.storage.upload_token = Some(UPLOAD_TOKEN.to_string());
    config
}

/// Points every upstream integration at `base_url` (a wiremock server).
pub fn config_with_upstream(base_url: &str) -> AppConfig {
    let mut config = test_config();
    config.mailerlite.api_key = Some("ml-key".to_string());
    config.mailerlite.api_base = base_url.to_string();
    config.notion.api_key = Some("notion-key".to_string());
    config.notion.database_id = Some("reading-list-db".to_string());
    config.notion.api_base = base_url.to_string();
    config.search.openai_api_key = Some("openai-key".to_string());
    config.search.openai_api_base = base_url.to_string();
    config.search.pinecone_api_key = Some("pinecone-key".to_string());
    config.search.tools_index_host = Some(base_url.to_string());
    config.search.templates_index_host = Some(base_url.to_string());
    config.storage.access_key_id = Some("AKIDEXAMPLE".to_string());
    config.storage.secret_access_key = Some("secret".to_string());
    config.storage.bucket = Some("assets".to_string());
    config.storage.endpoint = Some(base_url.to_string());
    config.storage.force_path_style = true;
    config
}

/// Builds the full router over `db` with `config`.
pub fn test_app(config: AppConfig, db: DatabaseConnection) -> Result<Router> {
    let state = AppState::new(Arc::new(config), db)?;
    Ok(create_app(state))
}

/// Sends one request through the router and returns status plus JSON body
/// (`Value::Null` for an empty body).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response<Body> = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap()
}

/// Inserts a tool shown on the site.
pub async fn insert_tool(
    db: &DatabaseConnection,
    name: &str,
    external_id: Option<&str>,
    table_order: i32,
) -> Result<tool::Model> {
    let now = Utc::now().fixed_offset();
    Ok(tool::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} description", name)),
        features: Set(serde_json::json!(["fast"])),
        new_features: Set(serde_json::json!([])),
        website_url: Set(format!("https://{}.example", name.to_lowercase())),
        source_url: Set(None),
        image_url: Set(None),
        affiliate_url: Set(None),
        external_id: Set(external_id.map(str::to_string)),
        show_on_site: Set(true),
        pricing: Set("free".to_string()),
        is_featured: Set(false),
        rating: Set(None),
        table_order: Set(table_order),
        date_added: Set(None),
        last_updated: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn insert_category(db: &DatabaseConnection, name: &str) -> Result<category::Model> {
    Ok(category::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn link_category(db: &DatabaseConnection, tool_id: i32, category_id: i32) -> Result<()> {
    tool_category::ActiveModel {
        tool_id: Set(tool_id),
        category_id: Set(category_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn insert_template(
    db: &DatabaseConnection,
    name: &str,
    external_id: Option<&str>,
    score: f64,
    available: bool,
) -> Result<n8n_template::Model> {
    let now = Utc::now().fixed_offset();
    Ok(n8n_template::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} template", name)),
        download_url: Set(format!("https://templates.example/{}.json", name)),
        external_id: Set(external_id.map(str::to_string)),
        score: Set(score),
        available_on_website: Set(available),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn insert_landing_page(
    db: &DatabaseConnection,
    slug: &str,
    group_ids: &[&str],
    is_active: bool,
) -> Result<landing_page::Model> {
    let now = Utc::now().fixed_offset();
    Ok(landing_page::ActiveModel {
        title: Set(format!("{} page", slug)),
        slug: Set(slug.to_string()),
        description: Set("Landing page".to_string()),
        template_content: Set(Some("Here is your template".to_string())),
        mailerlite_group_ids: Set(serde_json::json!(group_ids)),
        is_active: Set(is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn insert_canonical_story(
    db: &DatabaseConnection,
    title: &str,
    status: Option<&str>,
    rank: Option<i32>,
    hours_ago: i64,
) -> Result<canonical_news_story::Model> {
    let now = Utc::now().fixed_offset();
    Ok(canonical_news_story::ActiveModel {
        title: Set(title.to_string()),
        summary: Set(format!("{} summary", title)),
        event_time: Set(Some(now - chrono::Duration::hours(hours_ago))),
        rank: Set(rank),
        status: Set(status.map(str::to_string)),
        is_noteworthy: Set(false),
        notion_page_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn insert_captured_story(
    db: &DatabaseConnection,
    canonical_story_id: Option<i32>,
    source: &str,
    url: &str,
    minutes_ago: i64,
) -> Result<captured_news_story::Model> {
    let now = Utc::now().fixed_offset();
    Ok(captured_news_story::ActiveModel {
        canonical_story_id: Set(canonical_story_id),
        title: Set(format!("{} story", source)),
        text: Set("Body".to_string()),
        url: Set(url.to_string()),
        source: Set(source.to_string()),
        author: Set(None),
        published_date: Set(None),
        captured_at: Set(now - chrono::Duration::minutes(minutes_ago)),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

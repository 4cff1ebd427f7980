//! # Server Configuration
//!
//! Router assembly, shared application state and the OpenAPI document for
//! the Applied AI API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::admin_auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{
    self, automations, contact, landing_pages, mastermind, news, storage, templates, tools,
    waiting_list,
};
use crate::integrations::groups_cache::GroupsCache;
use crate::integrations::mailerlite::MailerLiteClient;
use crate::integrations::notion::NotionClient;
use crate::integrations::postmark::PostmarkClient;
use crate::search::SearchService;
use crate::storage::StorageClient;
use crate::telemetry::trace_id_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub mailerlite: MailerLiteClient,
    /// Process-wide MailerLite group listing
    pub groups_cache: GroupsCache,
    pub notion: NotionClient,
    /// Contact form notifications
    pub postmark: PostmarkClient,
    pub search: SearchService,
    pub storage: StorageClient,
}

impl AppState {
    /// Builds every integration client from configuration. Clients with
    /// missing credentials still build and fail per request instead.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> anyhow::Result<Self> {
        let mailerlite =
            MailerLiteClient::new(&config.mailerlite).context("Failed to build MailerLite client")?;
        let groups_cache = GroupsCache::new(Duration::from_secs(
            config.mailerlite.groups_cache_ttl_seconds,
        ));
        let notion = NotionClient::new(&config.notion).context("Failed to build Notion client")?;
        let postmark =
            PostmarkClient::new(&config.email).context("Failed to build Postmark client")?;
        let search = SearchService::new(&config.search).context("Failed to build search service")?;
        let storage = StorageClient::new(&config.storage).context("Failed to build storage client")?;

        Ok(Self {
            config,
            db,
            mailerlite,
            groups_cache,
            notion,
            postmark,
            search,
            storage,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Catalog
        .route("/api/tools/", get(tools::list_tools))
        .route("/api/tools/categories/", get(tools::list_categories))
        .route("/api/tools/search/", post(tools::search_tools))
        .route("/api/tools/{id}/", get(tools::get_tool))
        .route("/api/tools/{id}/reorder/", post(tools::reorder_tool))
        .route("/api/automations/", get(automations::list_automations))
        .route("/api/automations/{id}/", get(automations::get_automation))
        .route("/api/templates/", get(templates::list_templates))
        .route("/api/templates/search/", post(templates::search_templates))
        .route("/api/templates/{id}/", get(templates::get_template))
        // News; mutations check the admin token in the handler
        .route(
            "/api/news/canonical-stories/",
            get(news::list_canonical_stories).post(news::create_canonical_story),
        )
        .route(
            "/api/news/canonical-stories/{id}/",
            get(news::get_canonical_story)
                .put(news::update_canonical_story)
                .delete(news::delete_canonical_story),
        )
        .route(
            "/api/news/canonical-stories/{id}/noteworthy/",
            post(news::mark_noteworthy),
        )
        .route(
            "/api/news/captured-stories/",
            get(news::list_captured_stories).post(news::create_captured_story),
        )
        .route(
            "/api/news/captured-stories/{id}/",
            get(news::get_captured_story)
                .put(news::update_captured_story)
                .delete(news::delete_captured_story),
        )
        .route("/api/news/feed/", get(news::news_feed))
        .route("/api/news/articles/", get(news::list_articles))
        .route("/api/news/articles/{id}/", get(news::get_article))
        // Landing pages and forms
        .route(
            "/api/landing-pages/{slug}/",
            get(landing_pages::get_landing_page),
        )
        .route(
            "/api/landing-pages/{slug}/submit/",
            post(landing_pages::submit_landing_page_step),
        )
        .route("/api/waiting-list/", post(waiting_list::submit_waiting_list))
        .route("/api/contact/", post(contact::submit_contact))
        .route("/api/mastermind/tiers/", get(mastermind::list_tiers))
        .route("/api/mastermind/tiers/{id}/", get(mastermind::get_tier))
        // Storage; both check the upload token
        .route("/api/storage/presign/", post(storage::presign_upload))
        .route("/api/storage/upload/", post(storage::upload_file));

    let admin = Router::new()
        .route(
            "/api/admin/landing-pages/",
            get(landing_pages::list_landing_pages).post(landing_pages::create_landing_page),
        )
        .route(
            "/api/admin/landing-pages/{slug}/",
            get(landing_pages::get_landing_page_admin).put(landing_pages::update_landing_page),
        )
        .route(
            "/api/admin/mailerlite/groups/",
            get(landing_pages::list_mailerlite_groups),
        )
        .route(
            "/api/admin/mailerlite/groups/refresh/",
            post(landing_pages::refresh_mailerlite_groups),
        )
        .route(
            "/api/admin/mastermind/members/",
            get(mastermind::list_members).post(mastermind::create_member),
        )
        .route(
            "/api/admin/mastermind/members/{id}/",
            get(mastermind::get_member)
                .put(mastermind::update_member)
                .delete(mastermind::delete_member),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&config),
            admin_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), db)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

/// Registers the bearer schemes used by admin and upload endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = || {
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build())
            };
            components.add_security_scheme("bearer_auth", bearer());
            components.add_security_scheme("upload_token", bearer());
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::tools::list_tools,
        crate::handlers::tools::get_tool,
        crate::handlers::tools::list_categories,
        crate::handlers::tools::search_tools,
        crate::handlers::tools::reorder_tool,
        crate::handlers::automations::list_automations,
        crate::handlers::automations::get_automation,
        crate::handlers::templates::list_templates,
        crate::handlers::templates::get_template,
        crate::handlers::templates::search_templates,
        crate::handlers::news::list_canonical_stories,
        crate::handlers::news::get_canonical_story,
        crate::handlers::news::create_canonical_story,
        crate::handlers::news::update_canonical_story,
        crate::handlers::news::delete_canonical_story,
        crate::handlers::news::mark_noteworthy,
        crate::handlers::news::list_captured_stories,
        crate::handlers::news::get_captured_story,
        crate::handlers::news::create_captured_story,
        crate::handlers::news::update_captured_story,
        crate::handlers::news::delete_captured_story,
        crate::handlers::news::news_feed,
        crate::handlers::news::list_articles,
        crate::handlers::news::get_article,
        crate::handlers::landing_pages::get_landing_page,
        crate::handlers::landing_pages::submit_landing_page_step,
        crate::handlers::landing_pages::list_landing_pages,
        crate::handlers::landing_pages::get_landing_page_admin,
        crate::handlers::landing_pages::create_landing_page,
        crate::handlers::landing_pages::update_landing_page,
        crate::handlers::landing_pages::list_mailerlite_groups,
        crate::handlers::landing_pages::refresh_mailerlite_groups,
        crate::handlers::waiting_list::submit_waiting_list,
        crate::handlers::contact::submit_contact,
        crate::handlers::mastermind::list_tiers,
        crate::handlers::mastermind::get_tier,
        crate::handlers::mastermind::list_members,
        crate::handlers::mastermind::get_member,
        crate::handlers::mastermind::create_member,
        crate::handlers::mastermind::update_member,
        crate::handlers::mastermind::delete_member,
        crate::handlers::storage::presign_upload,
        crate::handlers::storage::upload_file,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::types::MessageResponse,
            crate::handlers::tools::ToolInfo,
            crate::handlers::tools::CategoryInfo,
            crate::handlers::tools::SearchRequest,
            crate::handlers::tools::ToolSearchResult,
            crate::handlers::tools::ToolSearchResponse,
            crate::handlers::tools::ReorderRequest,
            crate::handlers::automations::AutomationInfo,
            crate::handlers::templates::TemplateInfo,
            crate::handlers::templates::TemplateSearchResult,
            crate::handlers::templates::TemplateSearchResponse,
            crate::handlers::news::CanonicalStoryInfo,
            crate::handlers::news::CanonicalStoryRequest,
            crate::handlers::news::CapturedStoryInfo,
            crate::handlers::news::CapturedStoryRequest,
            crate::handlers::news::FeedItem,
            crate::handlers::news::FeedResponse,
            crate::handlers::news::NewsArticleInfo,
            crate::handlers::landing_pages::LandingPageInfo,
            crate::handlers::landing_pages::SubmitStepRequest,
            crate::handlers::landing_pages::SubmitStepResponse,
            crate::handlers::landing_pages::LandingPageAdminInfo,
            crate::handlers::landing_pages::LandingPageRequest,
            crate::handlers::landing_pages::GroupRef,
            crate::handlers::landing_pages::GroupInfo,
            crate::handlers::landing_pages::GroupsResponse,
            crate::handlers::waiting_list::WaitingListRequest,
            crate::handlers::waiting_list::WaitingListSubmissionInfo,
            crate::handlers::contact::ContactRequest,
            crate::handlers::mastermind::MembershipTierInfo,
            crate::handlers::mastermind::MemberInfo,
            crate::handlers::mastermind::MemberRequest,
            crate::handlers::storage::PresignRequest,
            crate::handlers::storage::PresignResponse,
            crate::handlers::storage::UploadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "tools", description = "AI tools catalog"),
        (name = "automations", description = "Automation catalog"),
        (name = "templates", description = "n8n workflow templates"),
        (name = "news", description = "News stories, feed and articles"),
        (name = "landing-pages", description = "Landing pages and the subscription flow"),
        (name = "forms", description = "Waiting list and contact form"),
        (name = "mastermind", description = "Mastermind membership tiers"),
        (name = "storage", description = "Object storage uploads"),
        (name = "admin", description = "Admin-only endpoints"),
    ),
    info(
        title = "Applied AI API",
        description = "Content and lead-management API for the Applied AI website",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_admin_security() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["paths"]["/api/tools/"]["get"].is_object());
        assert!(json["paths"]["/api/landing-pages/{slug}/submit/"]["post"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
        assert!(json["components"]["securitySchemes"]["upload_token"].is_object());
    }

    #[test]
    fn cors_layer_accepts_configured_origins() {
        let config = AppConfig {
            cors_allowed_origins: vec!["https://appliedai.example".to_string()],
            ..AppConfig::default()
        };
        // Construction must not panic with explicit origins or with none.
        let _ = cors_layer(&config);
        let _ = cors_layer(&AppConfig::default());
    }
}

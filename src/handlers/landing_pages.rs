//! # Landing Page API Handlers
//!
//! Public page lookup and the two-step subscription flow, plus admin page
//! management and the MailerLite group picker endpoints.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AdminAuth;
use crate::error::{ApiError, bad_request, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, timestamp};
use crate::handlers::{normalize_email, required_field};
use crate::integrations::mailerlite::Group;
use crate::models::landing_page;
use crate::pagination::PageRequest;
use crate::repositories::landing_page::{LandingPageInput, LandingPageRepository};
use crate::repositories::subscription::{StepRecord, SubscriptionRepository};
use crate::server::AppState;
use crate::subscription::{
    BusinessType, SubscriptionStep, record_business_type, subscribe_email,
};

const MAX_FIRST_NAME_LEN: usize = 100;
const MAX_SLUG_LEN: usize = 50;

static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|_| unreachable!("slug pattern is valid"))
});

fn page_repo(state: &AppState) -> LandingPageRepository {
    LandingPageRepository::new(Arc::new(state.db.clone()))
}

/// Public landing page fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LandingPageInfo {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub template_content: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<landing_page::Model> for LandingPageInfo {
    fn from(model: landing_page::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            template_content: model.template_content,
            is_active: model.is_active,
            created_at: timestamp(&model.created_at),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/landing-pages/{slug}/",
    params(("slug" = String, Path, description = "Landing page slug")),
    responses(
        (status = 200, description = "Active landing page", body = LandingPageInfo),
        (status = 404, description = "No active page with this slug", body = ApiError)
    ),
    tag = "landing-pages"
)]
pub async fn get_landing_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LandingPageInfo>, ApiError> {
    page_repo(&state)
        .find_active_by_slug(&slug)
        .await?
        .map(|page| Json(LandingPageInfo::from(page)))
        .ok_or_else(|| not_found("Landing page"))
}

/// One step of the subscription flow
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitStepRequest {
    /// `email` or `business_type`
    pub step: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    /// `implement` or `sell_services`
    pub business_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SubmitStepResponse {
    /// Reply to the `email` step
    EmailCaptured {
        success: bool,
        message: String,
        next_step: String,
    },
    /// Reply to the `business_type` step
    Completed {
        success: bool,
        message: String,
        template: Option<String>,
        completed: bool,
    },
}

/// Runs one step of the subscription flow for an active landing page
#[utoipa::path(
    post,
    path = "/api/landing-pages/{slug}/submit/",
    params(("slug" = String, Path, description = "Landing page slug")),
    request_body = SubmitStepRequest,
    responses(
        (status = 200, description = "Step accepted", body = SubmitStepResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "No active page with this slug", body = ApiError),
        (status = 500, description = "MailerLite request failed", body = ApiError)
    ),
    tag = "landing-pages"
)]
pub async fn submit_landing_page_step(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Result<Json<SubmitStepRequest>, JsonRejection>,
) -> Result<Json<SubmitStepResponse>, ApiError> {
    let page = page_repo(&state)
        .find_active_by_slug(&slug)
        .await?
        .ok_or_else(|| not_found("Landing page"))?;
    let Json(request) = payload?;

    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(normalize_email)
        .transpose()?;
    let first_name = request
        .first_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if let Some(name) = first_name
        && name.chars().count() > MAX_FIRST_NAME_LEN
    {
        return Err(validation_error(
            "Ensure first name has at most 100 characters",
            serde_json::json!({ "first_name": name.chars().count() }),
        ));
    }

    let step = SubscriptionStep::from_str(request.step.as_deref().unwrap_or_default().trim())
        .map_err(|_| bad_request("Invalid step"))?;

    let sessions = SubscriptionRepository::new(Arc::new(state.db.clone()));

    match step {
        SubscriptionStep::Email => {
            let (Some(email), Some(first_name)) = (email, first_name) else {
                return Err(bad_request("Email and first name are required"));
            };

            subscribe_email(&state.mailerlite, &email, first_name, &page.group_ids()).await?;

            let recorded = sessions
                .record_step(StepRecord {
                    landing_page_id: page.id,
                    email: &email,
                    step,
                    business_type: None,
                })
                .await?;
            tracing::info!(slug = %page.slug, state = %recorded.session.state, "Landing page email step accepted");

            Ok(Json(SubmitStepResponse::EmailCaptured {
                success: true,
                message: "Subscriber created successfully".to_string(),
                next_step: SubscriptionStep::BusinessType.as_str().to_string(),
            }))
        }
        SubscriptionStep::BusinessType => {
            let Some(email) = email else {
                return Err(bad_request("Email is required"));
            };
            let business_type = BusinessType::from_str(
                request.business_type.as_deref().unwrap_or_default().trim(),
            )
            .map_err(|message| bad_request(&message))?;

            record_business_type(&state.mailerlite, &email, business_type).await?;

            sessions
                .record_step(StepRecord {
                    landing_page_id: page.id,
                    email: &email,
                    step,
                    business_type: Some(business_type.as_str()),
                })
                .await?;
            tracing::info!(slug = %page.slug, business_type = business_type.as_str(), "Landing page flow completed");

            Ok(Json(SubmitStepResponse::Completed {
                success: true,
                message: "Business type updated successfully".to_string(),
                template: page.template_content,
                completed: true,
            }))
        }
    }
}

// Admin

/// Group reference with its resolved name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// Landing page as seen by administrators
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LandingPageAdminInfo {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub template_content: Option<String>,
    /// Ordered group ids; new subscribers are created in the first one
    pub mailerlite_group_ids: Vec<String>,
    pub mailerlite_groups: Vec<GroupRef>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Resolves every group name the given pages reference in one pass.
async fn group_names(state: &AppState, pages: &[landing_page::Model]) -> HashMap<String, String> {
    let ids: Vec<String> = pages.iter().flat_map(|page| page.group_ids()).collect();
    state
        .groups_cache
        .resolve_names(&state.mailerlite, ids.iter().map(String::as_str))
        .await
}

fn admin_info(model: landing_page::Model, names: &HashMap<String, String>) -> LandingPageAdminInfo {
    let group_ids = model.group_ids();
    let groups = group_ids
        .iter()
        .map(|id| GroupRef {
            id: id.clone(),
            name: names
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("Group ID: {}", id)),
        })
        .collect();

    LandingPageAdminInfo {
        id: model.id,
        title: model.title,
        slug: model.slug,
        description: model.description,
        template_content: model.template_content,
        mailerlite_group_ids: group_ids,
        mailerlite_groups: groups,
        is_active: model.is_active,
        created_at: timestamp(&model.created_at),
        updated_at: timestamp(&model.updated_at),
    }
}

async fn single_admin_info(state: &AppState, model: landing_page::Model) -> LandingPageAdminInfo {
    let names = group_names(state, std::slice::from_ref(&model)).await;
    admin_info(model, &names)
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListLandingPagesQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Writable landing page fields; updates replace every field
#[derive(Debug, Deserialize, ToSchema)]
pub struct LandingPageRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub template_content: Option<String>,
    #[serde(default)]
    pub mailerlite_group_ids: Vec<String>,
    pub is_active: Option<bool>,
}

impl LandingPageRequest {
    /// Validates fields and checks every group id against the cached listing.
    async fn into_input(self, state: &AppState) -> Result<LandingPageInput, ApiError> {
        let title = required_field(self.title, "Title")?;
        let slug = required_field(self.slug, "Slug")?;
        if slug.len() > MAX_SLUG_LEN || !SLUG_PATTERN.is_match(&slug) {
            return Err(validation_error(
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens",
                serde_json::json!({ "slug": slug }),
            ));
        }

        let mut group_ids: Vec<String> = Vec::new();
        for id in self.mailerlite_group_ids {
            let id = id.trim().to_string();
            if !id.is_empty() && !group_ids.contains(&id) {
                group_ids.push(id);
            }
        }
        if !group_ids.is_empty() {
            let groups = state.groups_cache.get_or_fetch(&state.mailerlite).await?;
            if let Some(unknown) = group_ids.iter().find(|id| !groups.iter().any(|g| &g.id == *id)) {
                return Err(validation_error(
                    &format!(
                        "Group ID \"{}\" not found in MailerLite. Please refresh the groups list and try again.",
                        unknown
                    ),
                    serde_json::json!({ "mailerlite_group_ids": unknown }),
                ));
            }
        }

        Ok(LandingPageInput {
            title,
            slug,
            description: self.description.unwrap_or_default(),
            template_content: self.template_content.filter(|t| !t.trim().is_empty()),
            mailerlite_group_ids: group_ids,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/landing-pages/",
    security(("bearer_auth" = [])),
    params(ListLandingPagesQuery),
    responses(
        (status = 200, description = "Every landing page, newest first", body = PaginatedResponse<LandingPageAdminInfo>),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_landing_pages(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(query): Query<ListLandingPagesQuery>,
) -> Result<Json<PaginatedResponse<LandingPageAdminInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let (pages, total) = page_repo(&state).list(page).await?;

    let names = group_names(&state, &pages).await;
    let results = pages
        .into_iter()
        .map(|model| admin_info(model, &names))
        .collect();
    Ok(Json(PaginatedResponse::new(results, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/admin/landing-pages/{slug}/",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Landing page slug")),
    responses(
        (status = 200, description = "Landing page, active or not", body = LandingPageAdminInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Landing page not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn get_landing_page_admin(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(slug): Path<String>,
) -> Result<Json<LandingPageAdminInfo>, ApiError> {
    let page = page_repo(&state)
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| not_found("Landing page"))?;
    Ok(Json(single_admin_info(&state, page).await))
}

#[utoipa::path(
    post,
    path = "/api/admin/landing-pages/",
    security(("bearer_auth" = [])),
    request_body = LandingPageRequest,
    responses(
        (status = 201, description = "Landing page created", body = LandingPageAdminInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Slug already in use", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_landing_page(
    State(state): State<AppState>,
    _admin: AdminAuth,
    payload: Result<Json<LandingPageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LandingPageAdminInfo>), ApiError> {
    let Json(request) = payload?;
    let input = request.into_input(&state).await?;

    let page = page_repo(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(single_admin_info(&state, page).await)))
}

#[utoipa::path(
    put,
    path = "/api/admin/landing-pages/{slug}/",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Current landing page slug")),
    request_body = LandingPageRequest,
    responses(
        (status = 200, description = "Landing page updated", body = LandingPageAdminInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Landing page not found", body = ApiError),
        (status = 409, description = "Slug already in use", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_landing_page(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(slug): Path<String>,
    payload: Result<Json<LandingPageRequest>, JsonRejection>,
) -> Result<Json<LandingPageAdminInfo>, ApiError> {
    let Json(request) = payload?;
    let input = request.into_input(&state).await?;

    let page = page_repo(&state)
        .update(&slug, input)
        .await?
        .ok_or_else(|| not_found("Landing page"))?;
    tracing::info!(slug = %page.slug, "Landing page updated");
    Ok(Json(single_admin_info(&state, page).await))
}

// MailerLite groups

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    /// `"<name> (ID: <id>)"`
    pub display_label: String,
}

impl From<&Group> for GroupInfo {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            display_label: group.display_label(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupsResponse {
    pub groups: Vec<GroupInfo>,
    pub count: usize,
}

fn groups_response(groups: &[Group]) -> GroupsResponse {
    GroupsResponse {
        groups: groups.iter().map(GroupInfo::from).collect(),
        count: groups.len(),
    }
}

/// Cached MailerLite group listing
#[utoipa::path(
    get,
    path = "/api/admin/mailerlite/groups/",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Group listing", body = GroupsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "MailerLite request failed", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_mailerlite_groups(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<GroupsResponse>, ApiError> {
    let groups = state.groups_cache.get_or_fetch(&state.mailerlite).await?;
    Ok(Json(groups_response(&groups)))
}

/// Evicts the group cache and fetches a fresh listing
#[utoipa::path(
    post,
    path = "/api/admin/mailerlite/groups/refresh/",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fresh group listing", body = GroupsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "MailerLite request failed", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn refresh_mailerlite_groups(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<GroupsResponse>, ApiError> {
    let groups = state.groups_cache.refresh(&state.mailerlite).await?;
    tracing::info!(count = groups.len(), "MailerLite groups refreshed");
    Ok(Json(groups_response(&groups)))
}

//! # Automations API Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, timestamp};
use crate::models::automation;
use crate::pagination::{PageRequest, parse_ordering};
use crate::repositories::automation::{AutomationFilter, AutomationRepository, ORDERING_FIELDS};
use crate::server::AppState;

/// Query parameters for the automations listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListAutomationsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub category: Option<String>,
    /// One of `beginner`, `intermediate`, `advanced`
    pub complexity: Option<String>,
    /// One of `available`, `coming_soon`, `beta`
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub search: Option<String>,
    /// `name` or `created_at`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutomationInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub complexity: String,
    pub time_saved: String,
    pub status: String,
    pub setup_instructions: String,
    pub is_featured: bool,
    pub external_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<automation::Model> for AutomationInfo {
    fn from(model: automation::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            complexity: model.complexity,
            time_saved: model.time_saved,
            status: model.status,
            setup_instructions: model.setup_instructions,
            is_featured: model.is_featured,
            external_id: model.external_id,
            created_at: timestamp(&model.created_at),
            updated_at: timestamp(&model.updated_at),
        }
    }
}

fn check_choice(field: &str, value: Option<&str>, choices: &[&str]) -> Result<(), ApiError> {
    match value {
        Some(value) if !choices.contains(&value) => Err(validation_error(
            &format!("Unsupported {} filter", field),
            serde_json::json!({ field: value, "allowed": choices }),
        )),
        _ => Ok(()),
    }
}

/// Lists automations, featured first
#[utoipa::path(
    get,
    path = "/api/automations/",
    params(ListAutomationsQuery),
    responses(
        (status = 200, description = "Page of automations", body = PaginatedResponse<AutomationInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "automations"
)]
pub async fn list_automations(
    State(state): State<AppState>,
    Query(query): Query<ListAutomationsQuery>,
) -> Result<Json<PaginatedResponse<AutomationInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), ORDERING_FIELDS)?;
    check_choice("complexity", query.complexity.as_deref(), &automation::COMPLEXITY_CHOICES)?;
    check_choice("status", query.status.as_deref(), &automation::STATUS_CHOICES)?;

    let filter = AutomationFilter {
        category: query.category,
        complexity: query.complexity,
        status: query.status,
        is_featured: query.is_featured,
        search: query.search,
    };

    let repo = AutomationRepository::new(Arc::new(state.db.clone()));
    let (automations, total) = repo.list(&filter, ordering, page).await?;

    Ok(Json(PaginatedResponse::new(
        automations.into_iter().map(AutomationInfo::from).collect(),
        total,
        page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/automations/{id}/",
    params(("id" = i32, Path, description = "Automation id")),
    responses(
        (status = 200, description = "Automation", body = AutomationInfo),
        (status = 404, description = "Automation not found", body = ApiError)
    ),
    tag = "automations"
)]
pub async fn get_automation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AutomationInfo>, ApiError> {
    let repo = AutomationRepository::new(Arc::new(state.db.clone()));
    repo.find_by_id(id)
        .await?
        .map(|automation| Json(AutomationInfo::from(automation)))
        .ok_or_else(|| not_found("Automation"))
}

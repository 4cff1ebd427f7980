//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Applied AI API.

pub mod automations;
pub mod contact;
pub mod landing_pages;
pub mod mastermind;
pub mod news;
pub mod storage;
pub mod templates;
pub mod tools;
pub mod types;
pub mod waiting_list;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::error::{ApiError, ErrorType};
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health status of the service and its database
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Liveness and database connectivity check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(err) = db::health_check(&state.db).await {
        tracing::error!(error = %err, "Health check failed");
        return Err(ErrorType::ServiceUnavailable.with_message("Database unreachable"));
    }

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}

/// Parses a required, non-blank string field, naming it in the error.
pub(crate) fn required_field(value: Option<String>, label: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            crate::error::validation_error(
                &format!("{} is required", label),
                serde_json::json!({ "field": label.to_lowercase().replace(' ', "_") }),
            )
        })
}

/// Trims and lower-cases an address, rejecting anything without `@`.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(crate::error::validation_error(
            "Enter a valid email address",
            serde_json::json!({ "email": raw }),
        ));
    }
    Ok(email)
}

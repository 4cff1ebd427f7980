//! # Waiting List API Handler

use std::sync::Arc;

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::types::timestamp;
use crate::handlers::{normalize_email, required_field};
use crate::models::waiting_list_submission;
use crate::repositories::waiting_list::{WaitingListInput, WaitingListRepository};
use crate::server::AppState;
use crate::subscription::subscribe_email;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WaitingListRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub business_name: Option<String>,
    pub project_nature: Option<String>,
    pub budget: Option<String>,
}

impl TryFrom<WaitingListRequest> for WaitingListInput {
    type Error = ApiError;

    fn try_from(request: WaitingListRequest) -> Result<Self, Self::Error> {
        let email = required_field(request.email, "Email")?;
        Ok(Self {
            name: required_field(request.name, "Name")?,
            email: normalize_email(&email)?,
            business_name: required_field(request.business_name, "Business name")?,
            project_nature: required_field(request.project_nature, "Project nature")?,
            budget: required_field(request.budget, "Budget")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WaitingListSubmissionInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub business_name: String,
    pub project_nature: String,
    pub budget: String,
    pub mailerlite_subscribed: bool,
    pub created_at: String,
}

impl From<waiting_list_submission::Model> for WaitingListSubmissionInfo {
    fn from(model: waiting_list_submission::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            business_name: model.business_name,
            project_nature: model.project_nature,
            budget: model.budget,
            mailerlite_subscribed: model.mailerlite_subscribed,
            created_at: timestamp(&model.created_at),
        }
    }
}

/// Stores a waiting-list submission and subscribes the address to the
/// waiting-list group when one is configured
#[utoipa::path(
    post,
    path = "/api/waiting-list/",
    request_body = WaitingListRequest,
    responses(
        (status = 201, description = "Submission stored", body = WaitingListSubmissionInfo),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "forms"
)]
pub async fn submit_waiting_list(
    State(state): State<AppState>,
    payload: Result<Json<WaitingListRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WaitingListSubmissionInfo>), ApiError> {
    let Json(request) = payload?;
    let input = WaitingListInput::try_from(request)?;

    let repo = WaitingListRepository::new(Arc::new(state.db.clone()));
    let mut submission = repo.create(input).await?;
    tracing::info!(submission_id = submission.id, "Waiting list submission stored");

    if let Some(group_id) = state.config.mailerlite.waiting_list_group_id.clone() {
        let groups = [group_id];
        match subscribe_email(&state.mailerlite, &submission.email, &submission.name, &groups).await
        {
            Ok(()) => submission = repo.mark_subscribed(submission).await?,
            Err(err) => {
                tracing::error!(
                    submission_id = submission.id,
                    error = %err,
                    "Failed to add waiting list submission to MailerLite"
                );
            }
        }
    }

    Ok((StatusCode::CREATED, Json(WaitingListSubmissionInfo::from(submission))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> WaitingListRequest {
        WaitingListRequest {
            name: Some("Ada".to_string()),
            email: Some(" Ada@Example.com ".to_string()),
            business_name: Some("Engines Ltd".to_string()),
            project_nature: Some("Automate invoicing".to_string()),
            budget: Some("5k-10k".to_string()),
        }
    }

    #[test]
    fn complete_request_normalizes_email() {
        let input = WaitingListInput::try_from(complete()).unwrap();
        assert_eq!(input.email, "ada@example.com");
        assert_eq!(input.business_name, "Engines Ltd");
    }

    #[test]
    fn blank_field_is_rejected_by_name() {
        let request = WaitingListRequest {
            budget: Some("   ".to_string()),
            ..complete()
        };
        let err = WaitingListInput::try_from(request).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(&*err.message, "Budget is required");
    }
}

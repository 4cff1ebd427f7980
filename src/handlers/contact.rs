//! # Contact Form API Handler

use std::sync::Arc;

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorType};
use crate::handlers::types::MessageResponse;
use crate::handlers::{normalize_email, required_field};
use crate::integrations::postmark::OutboundEmail;
use crate::models::contact_submission;
use crate::repositories::contact::ContactRepository;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    /// Inquiry type chosen on the form
    #[serde(rename = "type")]
    pub inquiry_type: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/contact/",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message accepted", body = MessageResponse),
        (status = 400, description = "Missing field", body = ApiError),
        (status = 500, description = "Notification email could not be sent", body = ApiError)
    ),
    tag = "forms"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;

    let name = required_field(request.name, "Name")?;
    let email = normalize_email(&required_field(request.email, "Email")?)?;
    let message = required_field(request.message, "Message")?;
    let inquiry_type = required_field(request.inquiry_type, "Type")?;

    let repo = ContactRepository::new(Arc::new(state.db.clone()));
    let submission = repo.create(name, email, message, inquiry_type).await?;
    tracing::info!(
        submission_id = submission.id,
        inquiry_type = %submission.inquiry_type,
        "Contact form submission stored"
    );

    if state.postmark.is_configured() {
        let email = notification_email(&submission, &state.config.email.contact_recipients);
        state.postmark.send(&email).await.map_err(|err| {
            tracing::error!(submission_id = submission.id, error = %err, "Contact notification failed");
            ErrorType::Upstream.with_message("Failed to send message. Please try again later.")
        })?;
    } else {
        tracing::warn!(submission_id = submission.id, "Email not configured; contact notification skipped");
    }

    Ok(Json(MessageResponse::ok(
        "Your message has been sent successfully!",
    )))
}

fn notification_email(
    submission: &contact_submission::Model,
    recipients: &[String],
) -> OutboundEmail {
    let text_body = format!(
        "New contact form submission from the Applied AI website:\n\n\
         Name: {}\nEmail: {}\nType: {}\n\nMessage:\n{}\n",
        submission.name, submission.email, submission.inquiry_type, submission.message
    );
    OutboundEmail {
        to: recipients.to_vec(),
        subject: format!("New Contact Form Submission: {}", submission.inquiry_type),
        text_body,
        reply_to: Some(submission.email.clone()),
    }
}

//! Postmark transactional email client.
//!
//! Sends plain-text notifications through `POST /email`. Used for the
//! contact form; delivery is a single request with no retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum PostmarkError {
    #[error("Postmark server token is not configured")]
    NotConfigured,
    #[error("Postmark transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Postmark returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Plain-text message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub text_body: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: String,
    subject: &'a str,
    text_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    message_stream: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(rename = "MessageID")]
    message_id: String,
}

#[derive(Debug, Clone)]
pub struct PostmarkClient {
    http: reqwest::Client,
    api_base: String,
    server_token: Option<String>,
    from_address: Option<String>,
    message_stream: String,
}

impl PostmarkClient {
    pub fn new(config: &EmailConfig) -> Result<Self, PostmarkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            api_base: config.postmark_api_base.trim_end_matches('/').to_string(),
            server_token: config.postmark_server_token.clone(),
            from_address: config.from_address.clone(),
            message_stream: config.message_stream.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.server_token.is_some() && self.from_address.is_some()
    }

    /// Sends `email` and returns the Postmark message id.
    pub async fn send(&self, email: &OutboundEmail) -> Result<String, PostmarkError> {
        let (Some(token), Some(from)) = (&self.server_token, &self.from_address) else {
            return Err(PostmarkError::NotConfigured);
        };

        let body = SendEmailRequest {
            from,
            to: email.to.join(", "),
            subject: &email.subject,
            text_body: &email.text_body,
            reply_to: email.reply_to.as_deref(),
            message_stream: &self.message_stream,
        };

        let response = self
            .http
            .post(format!("{}/email", self.api_base))
            .header("X-Postmark-Server-Token", token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostmarkError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::info!(message_id = %sent.message_id, recipients = email.to.len(), "Sent email via Postmark");
        Ok(sent.message_id)
    }
}

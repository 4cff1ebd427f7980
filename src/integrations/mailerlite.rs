//! MailerLite subscriber and group API client.
//!
//! Thin wrapper over `https://connect.mailerlite.com/api`. Every call is a
//! single request with the configured timeout and no retries.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

use crate::config::MailerLiteConfig;

/// Errors returned by [`MailerLiteClient`].
#[derive(Debug, Error)]
pub enum MailerLiteError {
    #[error("MailerLite API key is not configured")]
    NotConfigured,
    #[error("MailerLite transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("MailerLite returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected MailerLite response: {0}")]
    Decode(String),
    #[error("invalid MailerLite API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Subscriber record as returned by MailerLite.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Subscriber {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub email: String,
}

/// Subscriber group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Group {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default = "unnamed_group")]
    pub name: String,
}

impl Group {
    /// Label used in admin pickers: `"<name> (ID: <id>)"`.
    pub fn display_label(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}

fn unnamed_group() -> String {
    "Unnamed Group".to_string()
}

/// Custom subscriber fields. Unset fields are left untouched upstream.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SubscriberFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_automation_in_their_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_ai_services: Option<u8>,
}

impl SubscriberFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct CreateSubscriberRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<&'a str>,
    #[serde(skip_serializing_if = "SubscriberFields::is_empty")]
    fields: SubscriberFields,
}

#[derive(Debug, Serialize)]
struct UpdateSubscriberRequest<'a> {
    fields: &'a SubscriberFields,
}

/// HTTP client for the MailerLite API.
#[derive(Debug, Clone)]
pub struct MailerLiteClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl MailerLiteClient {
    pub fn new(config: &MailerLiteConfig) -> Result<Self, MailerLiteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Looks up a subscriber by email. A 404 means "not subscribed".
    pub async fn get_subscriber(&self, email: &str) -> Result<Option<Subscriber>, MailerLiteError> {
        let response = self
            .request(Method::GET, &["subscribers", email])?
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("MailerLite subscriber not found");
            return Ok(None);
        }

        let envelope: DataEnvelope<Subscriber> = Self::decode(response).await?;
        Ok(Some(envelope.data))
    }

    /// Creates a subscriber, optionally starting in a single group.
    pub async fn create_subscriber(
        &self,
        email: &str,
        group_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Subscriber, MailerLiteError> {
        let body = CreateSubscriberRequest {
            email,
            groups: group_id.into_iter().collect(),
            fields: SubscriberFields {
                name: name.map(str::to_string),
                ..SubscriberFields::default()
            },
        };

        let response = self
            .request(Method::POST, &["subscribers"])?
            .json(&body)
            .send()
            .await?;

        let envelope: DataEnvelope<Subscriber> = Self::decode(response).await?;
        tracing::info!(?group_id, subscriber_id = %envelope.data.id, "Created MailerLite subscriber");
        Ok(envelope.data)
    }

    /// Updates custom fields on an existing subscriber.
    pub async fn update_subscriber(
        &self,
        subscriber_id: &str,
        fields: &SubscriberFields,
    ) -> Result<(), MailerLiteError> {
        if fields.is_empty() {
            return Ok(());
        }

        let response = self
            .request(Method::PUT, &["subscribers", subscriber_id])?
            .json(&UpdateSubscriberRequest { fields })
            .send()
            .await?;

        Self::ensure_success(response).await?;
        tracing::info!(subscriber_id, "Updated MailerLite subscriber fields");
        Ok(())
    }

    /// Adds an existing subscriber to a group.
    pub async fn add_subscriber_to_group(
        &self,
        email: &str,
        group_id: &str,
    ) -> Result<(), MailerLiteError> {
        let response = self
            .request(Method::POST, &["subscribers", email, "groups", group_id])?
            .send()
            .await?;

        Self::ensure_success(response).await?;
        tracing::debug!(group_id, "Added MailerLite subscriber to group");
        Ok(())
    }

    /// Lists all subscriber groups.
    pub async fn list_groups(&self) -> Result<Vec<Group>, MailerLiteError> {
        let response = self.request(Method::GET, &["groups"])?.send().await?;
        let envelope: DataEnvelope<Vec<Group>> = Self::decode(response).await?;
        tracing::info!(count = envelope.data.len(), "Fetched MailerLite groups");
        Ok(envelope.data)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, MailerLiteError> {
        let api_key = self.api_key.as_deref().ok_or(MailerLiteError::NotConfigured)?;
        let url = self.endpoint_url(segments)?;
        tracing::debug!(%method, endpoint = url.path(), "MailerLite request");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(api_key)
            .header("Accept", "application/json"))
    }

    /// Appends each segment percent-encoded, so emails containing `#`, `?`
    /// or `/` stay within a single path segment.
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, MailerLiteError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| MailerLiteError::InvalidBaseUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| MailerLiteError::InvalidBaseUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, MailerLiteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "MailerLite returned an error status");
        Err(MailerLiteError::Api {
            status: status.as_u16(),
            body: truncate(&body, 500),
        })
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, MailerLiteError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MailerLiteError::Decode(e.to_string()))
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        let truncated: String = body.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

/// MailerLite ids arrive as strings or as bare numbers depending on endpoint.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_display_label() {
        let group = Group {
            id: "123".to_string(),
            name: "Newsletter".to_string(),
        };
        assert_eq!(group.display_label(), "Newsletter (ID: 123)");
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let groups: DataEnvelope<Vec<Group>> = serde_json::from_value(json!({
            "data": [{"id": 42, "name": "A"}, {"id": "43"}]
        }))
        .unwrap();
        assert_eq!(groups.data[0].id, "42");
        assert_eq!(groups.data[1].id, "43");
        assert_eq!(groups.data[1].name, "Unnamed Group");
    }

    #[test]
    fn update_body_only_carries_set_fields() {
        let fields = SubscriberFields {
            uses_automation_in_their_business: Some(1),
            sell_ai_services: Some(0),
            ..SubscriberFields::default()
        };
        let body = serde_json::to_value(UpdateSubscriberRequest { fields: &fields }).unwrap();
        assert_eq!(
            body,
            json!({"fields": {"uses_automation_in_their_business": 1, "sell_ai_services": 0}})
        );
    }

    #[test]
    fn create_body_omits_empty_fields() {
        let body = serde_json::to_value(CreateSubscriberRequest {
            email: "a@b.com",
            groups: vec!["g1"],
            fields: SubscriberFields::default(),
        })
        .unwrap();
        assert_eq!(body, json!({"email": "a@b.com", "groups": ["g1"]}));

        let groupless = serde_json::to_value(CreateSubscriberRequest {
            email: "a@b.com",
            groups: Vec::new(),
            fields: SubscriberFields::default(),
        })
        .unwrap();
        assert_eq!(groupless, json!({"email": "a@b.com"}));
    }

    #[test]
    fn endpoint_segments_are_percent_encoded() {
        let client = MailerLiteClient::new(&MailerLiteConfig {
            api_base: "https://connect.mailerlite.com/api/".to_string(),
            ..MailerLiteConfig::default()
        })
        .unwrap();

        let url = client
            .endpoint_url(&["subscribers", "a#b?c/../d@example.com", "groups", "G2"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://connect.mailerlite.com/api/subscribers/a%23b%3Fc%2F..%2Fd@example.com/groups/G2"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[tokio::test]
    async fn unconfigured_client_fails_fast() {
        let client = MailerLiteClient::new(&MailerLiteConfig::default()).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.list_groups().await,
            Err(MailerLiteError::NotConfigured)
        ));
    }
}

//! # Storage API Handlers
//!
//! Presigned PUT URLs for direct uploads and a proxied multipart upload.
//! Both require the upload bearer token.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::verify_upload_token;
use crate::error::{ApiError, bad_request, validation_error};
use crate::server::AppState;
use crate::storage::{DEFAULT_CONTENT_TYPE, is_valid_object_key, upload_key};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    /// Object key, e.g. `images/header.png`
    pub key: Option<String>,
    pub content_type: Option<String>,
    /// `public-read` or omitted for a private object
    pub acl: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    pub url: String,
    /// Headers the PUT must carry
    pub headers: BTreeMap<String, String>,
    pub public_url: Option<String>,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub bucket: String,
    pub key: String,
    pub url: String,
    pub size: usize,
}

#[utoipa::path(
    post,
    path = "/api/storage/presign/",
    security(("upload_token" = [])),
    request_body = PresignRequest,
    responses(
        (status = 200, description = "Presigned PUT URL", body = PresignResponse),
        (status = 400, description = "Missing or unsafe key", body = ApiError),
        (status = 401, description = "Invalid upload token", body = ApiError),
        (status = 500, description = "Storage not configured", body = ApiError)
    ),
    tag = "storage"
)]
pub async fn presign_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PresignRequest>, JsonRejection>,
) -> Result<Json<PresignResponse>, ApiError> {
    verify_upload_token(&state.config, &headers)?;
    let Json(request) = payload?;

    let key = request
        .key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| bad_request("Missing key"))?;
    if !is_valid_object_key(&key) {
        return Err(validation_error(
            "Object key must be relative and must not contain '.' or '..' segments",
            serde_json::json!({ "key": key }),
        ));
    }
    let content_type = request
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let acl = request.acl.filter(|acl| !acl.trim().is_empty());

    let presigned = state
        .storage
        .presign_put(&key, &content_type, acl.as_deref(), Utc::now())?;

    Ok(Json(PresignResponse {
        url: presigned.url,
        headers: presigned.headers,
        public_url: presigned.public_url,
        bucket: presigned.bucket,
        key: presigned.key,
    }))
}

/// Uploads the multipart `file` field as a public-read object
#[utoipa::path(
    post,
    path = "/api/storage/upload/",
    security(("upload_token" = [])),
    request_body(content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 201, description = "Object stored", body = UploadResponse),
        (status = 400, description = "No file in the form", body = ApiError),
        (status = 401, description = "Invalid upload token", body = ApiError),
        (status = 500, description = "Storage failure", body = ApiError)
    ),
    tag = "storage"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    verify_upload_token(&state.config, &headers)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(&format!("Invalid multipart body: {}", err.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|err| bad_request(&format!("Invalid multipart body: {}", err.body_text())))?;
        if body.is_empty() {
            return Err(bad_request("Uploaded file is empty"));
        }

        let key = upload_key(&filename, Utc::now());
        let stored = state
            .storage
            .upload_object(&key, &content_type, body.to_vec())
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                bucket: stored.bucket,
                key: stored.key,
                url: stored.url,
                size: stored.size,
            }),
        ));
    }

    Err(bad_request("No file provided"))
}

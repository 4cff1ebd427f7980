//! # Authentication
//!
//! Bearer-token checks for admin-only endpoints and for the proxied upload
//! endpoint. Tokens are compared in constant time against configuration.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// Marker type for authenticated admin requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAuth;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Middleware that admits only requests carrying a configured admin token
pub async fn admin_auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    if !matches_any(token, &config.admin_tokens) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with invalid token");
        return Err(unauthorized(Some("Invalid bearer token")));
    }

    request.extensions_mut().insert(AdminAuth);
    Ok(next.run(request).await)
}

/// Checks the upload bearer token. A missing configured token rejects everything.
pub fn verify_upload_token(config: &AppConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = extract_bearer_token(headers)?;
    let Some(expected) = config.storage.upload_token.as_deref() else {
        tracing::warn!("Upload attempted but no upload token is configured");
        return Err(unauthorized(Some("Uploads are disabled")));
    };

    if token_eq(token, expected) {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn matches_any(token: &str, configured: &[String]) -> bool {
    // Fold over every candidate so timing does not reveal which one matched.
    configured
        .iter()
        .fold(false, |found, candidate| found | token_eq(token, candidate))
}

fn token_eq(token: &str, expected: &str) -> bool {
    ConstantTimeEq::ct_eq(token.as_bytes(), expected.as_bytes()).into()
}

/// Admin marker extractor. Uses the marker set by [`admin_auth_middleware`]
/// when present, otherwise checks the bearer token itself, so routes that
/// mix public reads with admin writes can guard single handlers.
impl<S> FromRequestParts<S> for AdminAuth
where
    Arc<AppConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<AdminAuth>().copied() {
            return Ok(auth);
        }

        let config = Arc::<AppConfig>::from_ref(state);
        let token = extract_bearer_token(&parts.headers)?;
        if !matches_any(token, &config.admin_tokens) {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin request with invalid token");
            return Err(unauthorized(Some("Invalid bearer token")));
        }

        parts.extensions.insert(AdminAuth);
        Ok(AdminAuth)
    }
}

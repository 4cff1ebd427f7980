//! # Mastermind API Handlers
//!
//! Public membership tiers and admin-only member management.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};

use crate::auth::AdminAuth;
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, timestamp};
use crate::handlers::{normalize_email, required_field};
use crate::models::{member, membership_tier};
use crate::pagination::{PageRequest, parse_ordering};
use crate::repositories::mastermind::{MEMBER_ORDERING_FIELDS, MastermindRepository, MemberInput};
use crate::server::AppState;

fn repo(state: &AppState) -> MastermindRepository {
    MastermindRepository::new(Arc::new(state.db.clone()))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipTierInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price_cents: i32,
    pub billing_period: String,
    #[schema(value_type = Vec<String>)]
    pub features: JsonValue,
    pub is_popular: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<membership_tier::Model> for MembershipTierInfo {
    fn from(model: membership_tier::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price_cents: model.price_cents,
            billing_period: model.billing_period,
            features: model.features,
            is_popular: model.is_popular,
            is_active: model.is_active,
            created_at: timestamp(&model.created_at),
        }
    }
}

/// Active tiers, cheapest first
#[utoipa::path(
    get,
    path = "/api/mastermind/tiers/",
    responses(
        (status = 200, description = "Active membership tiers", body = Vec<MembershipTierInfo>)
    ),
    tag = "mastermind"
)]
pub async fn list_tiers(
    State(state): State<AppState>,
) -> Result<Json<Vec<MembershipTierInfo>>, ApiError> {
    let tiers = repo(&state).list_active_tiers().await?;
    Ok(Json(tiers.into_iter().map(MembershipTierInfo::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/mastermind/tiers/{id}/",
    params(("id" = i32, Path, description = "Tier id")),
    responses(
        (status = 200, description = "Membership tier", body = MembershipTierInfo),
        (status = 404, description = "Tier not found or inactive", body = ApiError)
    ),
    tag = "mastermind"
)]
pub async fn get_tier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MembershipTierInfo>, ApiError> {
    repo(&state)
        .find_active_tier(id)
        .await?
        .map(|tier| Json(MembershipTierInfo::from(tier)))
        .ok_or_else(|| not_found("Membership tier"))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberInfo {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub membership_tier: Option<i32>,
    pub is_active: bool,
    pub joined_at: String,
}

impl From<member::Model> for MemberInfo {
    fn from(model: member::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            membership_tier: model.membership_tier_id,
            is_active: model.is_active,
            joined_at: timestamp(&model.joined_at),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListMembersQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Matches first name, last name or email
    pub search: Option<String>,
    /// `joined_at`, `last_name` or `email`, `-` prefix for descending
    pub ordering: Option<String>,
}

/// Member fields; updates replace every field
#[derive(Debug, Deserialize, ToSchema)]
pub struct MemberRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub membership_tier: Option<i32>,
    pub is_active: Option<bool>,
}

impl MemberRequest {
    async fn into_input(self, repo: &MastermindRepository) -> Result<MemberInput, ApiError> {
        let first_name = required_field(self.first_name, "First name")?;
        let last_name = required_field(self.last_name, "Last name")?;
        let email = normalize_email(&required_field(self.email, "Email")?)?;

        if let Some(tier_id) = self.membership_tier
            && !repo.tier_exists(tier_id).await?
        {
            return Err(validation_error(
                "Membership tier does not exist",
                serde_json::json!({ "membership_tier": tier_id }),
            ));
        }

        Ok(MemberInput {
            first_name,
            last_name,
            email,
            membership_tier_id: self.membership_tier,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/mastermind/members/",
    security(("bearer_auth" = [])),
    params(ListMembersQuery),
    responses(
        (status = 200, description = "Page of members", body = PaginatedResponse<MemberInfo>),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_members(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(query): Query<ListMembersQuery>,
) -> Result<Json<PaginatedResponse<MemberInfo>>, ApiError> {
    let page = PageRequest::from_query(query.page, query.page_size)?;
    let ordering = parse_ordering(query.ordering.as_deref(), MEMBER_ORDERING_FIELDS)?;

    let (members, total) = repo(&state)
        .list_members(query.search.as_deref(), ordering, page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        members.into_iter().map(MemberInfo::from).collect(),
        total,
        page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/mastermind/members/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member id")),
    responses(
        (status = 200, description = "Member", body = MemberInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn get_member(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<Json<MemberInfo>, ApiError> {
    repo(&state)
        .find_member(id)
        .await?
        .map(|member| Json(MemberInfo::from(member)))
        .ok_or_else(|| not_found("Member"))
}

#[utoipa::path(
    post,
    path = "/api/admin/mastermind/members/",
    security(("bearer_auth" = [])),
    request_body = MemberRequest,
    responses(
        (status = 201, description = "Member created", body = MemberInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_member(
    State(state): State<AppState>,
    _admin: AdminAuth,
    payload: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MemberInfo>), ApiError> {
    let Json(request) = payload?;
    let repo = repo(&state);
    let input = request.into_input(&repo).await?;

    let member = repo.create_member(input).await?;
    tracing::info!(member_id = member.id, "Mastermind member created");
    Ok((StatusCode::CREATED, Json(MemberInfo::from(member))))
}

#[utoipa::path(
    put,
    path = "/api/admin/mastermind/members/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member id")),
    request_body = MemberRequest,
    responses(
        (status = 200, description = "Member updated", body = MemberInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_member(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
    payload: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<Json<MemberInfo>, ApiError> {
    let Json(request) = payload?;
    let repo = repo(&state);
    let input = request.into_input(&repo).await?;

    repo.update_member(id, input)
        .await?
        .map(|member| Json(MemberInfo::from(member)))
        .ok_or_else(|| not_found("Member"))
}

#[utoipa::path(
    delete,
    path = "/api/admin/mastermind/members/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member id")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn delete_member(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if !repo(&state).delete_member(id).await? {
        return Err(not_found("Member"));
    }
    tracing::info!(member_id = id, "Mastermind member deleted");
    Ok(StatusCode::NO_CONTENT)
}

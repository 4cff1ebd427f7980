//! # Pagination Utilities
//!
//! Page-number pagination and `ordering` parameter parsing shared by every
//! list endpoint.

use sea_orm::Order;

use crate::error::{ApiError, validation_error};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
const MAX_ORDERING_LEN: usize = 200;

/// Validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Validates raw query values, applying defaults for missing ones.
    pub fn from_query(page: Option<u64>, page_size: Option<u64>) -> Result<Self, ApiError> {
        Self::with_limits(page, page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn with_limits(
        page: Option<u64>,
        page_size: Option<u64>,
        default_size: u64,
        max_size: u64,
    ) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(validation_error(
                "page must be 1 or greater",
                serde_json::json!({ "page": page }),
            ));
        }

        let page_size = page_size.unwrap_or(default_size);
        if !(1..=max_size).contains(&page_size) {
            return Err(validation_error(
                &format!("page_size must be between 1 and {}", max_size),
                serde_json::json!({ "page_size": page_size }),
            ));
        }

        let offset = (page - 1).checked_mul(page_size);
        if offset.is_none_or(|offset| offset > i64::MAX as u64) {
            return Err(validation_error(
                "page is out of range",
                serde_json::json!({ "page": page }),
            ));
        }

        Ok(Self { page, page_size })
    }

    /// Zero-based page index as used by SeaORM paginators.
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    pub fn has_more(&self, total: u64) -> bool {
        self.page.saturating_mul(self.page_size) < total
    }
}

/// Parses a comma separated `ordering` value (`-` prefix for descending)
/// against a whitelist mapping public field names to columns.
///
/// Returns an empty vector when the parameter is absent or blank, in which
/// case the caller applies the resource's default ordering.
pub fn parse_ordering<C: Copy>(
    raw: Option<&str>,
    allowed: &[(&str, C)],
) -> Result<Vec<(C, Order)>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };

    if raw.len() > MAX_ORDERING_LEN {
        return Err(validation_error(
            "ordering is too long",
            serde_json::json!({ "ordering": raw.len() }),
        ));
    }

    let mut terms = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (field, order) = match part.strip_prefix('-') {
            Some(field) => (field, Order::Desc),
            None => (part, Order::Asc),
        };

        let Some((_, column)) = allowed.iter().find(|(name, _)| *name == field) else {
            let allowed_names: Vec<&str> = allowed.iter().map(|(name, _)| *name).collect();
            return Err(validation_error(
                &format!("Unsupported ordering field: {}", field),
                serde_json::json!({ "ordering": field, "allowed": allowed_names }),
            ));
        };
        terms.push((*column, order));
    }

    Ok(terms)
}

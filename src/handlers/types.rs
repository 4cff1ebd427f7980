//! # Common API Types
//!
//! This module contains shared types used across multiple API handlers,
//! including common response structures and pagination utilities.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pagination::PageRequest;

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Items on the requested page
    pub results: Vec<T>,
    /// Total number of matching items
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    /// Next page number (null on the last page)
    pub next: Option<u64>,
    /// Previous page number (null on the first page)
    pub previous: Option<u64>,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(results: Vec<T>, count: u64, page: PageRequest) -> Self {
        Self {
            results,
            count,
            page: page.page,
            page_size: page.page_size,
            next: page.has_more(count).then_some(page.page + 1),
            previous: (page.page > 1).then(|| page.page - 1),
        }
    }
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok<S: Into<String>>(message: S) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// RFC 3339 rendering in UTC used by every response timestamp
pub fn timestamp(value: &DateTimeWithTimeZone) -> String {
    value.with_timezone(&Utc).to_rfc3339()
}

pub fn optional_timestamp(value: Option<&DateTimeWithTimeZone>) -> Option<String> {
    value.map(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn page(page: u64, page_size: u64) -> PageRequest {
        PageRequest { page, page_size }
    }

    #[test]
    fn first_page_links() {
        let response = PaginatedResponse::new(vec![1, 2], 5, page(1, 2));
        assert_eq!(response.next, Some(2));
        assert_eq!(response.previous, None);
        assert_eq!(response.count, 5);
    }

    #[test]
    fn last_page_links() {
        let response = PaginatedResponse::new(vec![5], 5, page(3, 2));
        assert_eq!(response.next, None);
        assert_eq!(response.previous, Some(2));
    }

    #[test]
    fn timestamps_render_in_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let value = offset.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(timestamp(&value), "2025-03-01T10:00:00+00:00");
    }
}

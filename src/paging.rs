//! Paging and sorting query parameters.
//!
//! [`PageParams`] deserializes the raw `pageNumber`/`pageSize`/`sortBy`/
//! `sortDir` query with defaults and declarative bounds; calling
//! [`PageParams::into_query`] with the endpoint's allow-list produces the
//! validated [`PageQuery`] consumed by the stores.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

lazy_static! {
    static ref SORT_BY_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    static ref SORT_DIR_REGEX: Regex = Regex::new(r"^(?i)(asc|desc)$").unwrap();
}

/// Raw paging and sorting query parameters, common to every list
/// endpoint.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PageParams {
    /// Zero-based page index.
    #[validate(range(min = 0))]
    pub page_number: i64,

    /// Page size, 1..=200. Out-of-range values are rejected here, never
    /// clamped.
    #[validate(range(min = 1, max = 200))]
    pub page_size: i64,

    /// Primary sort field.
    #[validate(regex(path = "SORT_BY_REGEX", message = "sortBy must be alphanumeric/underscore"))]
    pub sort_by: String,

    /// Sort direction (asc|desc), case-insensitive.
    #[validate(regex(path = "SORT_DIR_REGEX", message = "sortDir must be 'asc' or 'desc'"))]
    pub sort_dir: String,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: 20,
            sort_by: "id".to_string(),
            sort_dir: "asc".to_string(),
        }
    }
}

impl PageParams {
    /// Converts to a [`PageQuery`] using the endpoint's allow-list of
    /// sortable fields. A `sortBy` outside the allow-list fails with
    /// `BadRequest` before any persistence access.
    pub fn into_query(self, allowed_sort_by: &[&str]) -> Result<PageQuery, ApiError> {
        if !allowed_sort_by.contains(&self.sort_by.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Invalid sortBy field '{}'. Allowed: {}",
                self.sort_by,
                allowed_sort_by.join(", ")
            )));
        }
        let sort_dir = if self.sort_dir.eq_ignore_ascii_case("desc") {
            SortDir::Desc
        } else {
            SortDir::Asc
        };
        Ok(PageQuery {
            page_number: self.page_number,
            page_size: self.page_size,
            sort_by: self.sort_by,
            sort_dir,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// A validated paging directive: the sort field has passed the
/// endpoint's allow-list.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub page_number: i64,
    pub page_size: i64,
    pub sort_by: String,
    pub sort_dir: SortDir,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.page_number * self.page_size
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total == 0 {
            0
        } else {
            (total + self.page_size - 1) / self.page_size
        }
    }
}

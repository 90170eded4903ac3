//! Pagination parameters and response metadata

use crate::error::{CommentsError, Result};
use serde::{Deserialize, Serialize};

/// Default page size / limit
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Number that may arrive as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Text(String),
}

impl Numeric {
    /// Coerce to a non-negative integer
    pub fn coerce(&self, name: &str) -> Result<u64> {
        let value = match self {
            Numeric::Int(n) => i128::from(*n),
            Numeric::Text(s) => s.trim().parse::<i128>().map_err(|_| {
                CommentsError::InvalidQuery(format!("'{}' must be an integer, got '{}'", name, s))
            })?,
        };
        if value < 0 {
            return Err(CommentsError::InvalidQuery(format!(
                "'{}' must not be negative, got {}",
                name, value
            )));
        }
        u64::try_from(value).map_err(|_| {
            CommentsError::InvalidQuery(format!("'{}' is out of range, got {}", name, value))
        })
    }
}

impl From<u64> for Numeric {
    fn from(n: u64) -> Self {
        i64::try_from(n)
            .map(Numeric::Int)
            .unwrap_or_else(|_| Numeric::Text(n.to_string()))
    }
}

/// Boolean that may arrive as `true` or the literal string `"true"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    pub fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Text(s) => s == "true",
        }
    }
}

/// User-facing pagination parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationInput {
    pub page: Option<Numeric>,
    pub page_size: Option<Numeric>,
    pub start: Option<Numeric>,
    pub limit: Option<Numeric>,
    pub with_count: Option<Flag>,
}

impl PaginationInput {
    /// Page-based input
    pub fn page(page: u64, page_size: u64) -> Self {
        Self {
            page: Some(page.into()),
            page_size: Some(page_size.into()),
            ..Default::default()
        }
    }

    /// Offset-based input
    pub fn offset(start: u64, limit: u64) -> Self {
        Self {
            start: Some(start.into()),
            limit: Some(limit.into()),
            ..Default::default()
        }
    }

    /// Request a total count
    pub fn with_count(mut self) -> Self {
        self.with_count = Some(Flag::Bool(true));
        self
    }

    /// Whether a count query was requested
    pub fn wants_count(&self) -> bool {
        self.with_count.as_ref().map(Flag::is_set).unwrap_or(false)
    }

    /// Pick the pagination mode and coerce its numbers.
    ///
    /// Presence of `page` or `pageSize` selects page-based pagination.
    pub fn resolve(&self) -> Result<Pagination> {
        if self.page.is_some() || self.page_size.is_some() {
            let page = coerce_or(&self.page, "page", 1)?;
            let page_size = coerce_or(&self.page_size, "pageSize", DEFAULT_PAGE_SIZE)?;
            if page.saturating_sub(1).checked_mul(page_size).is_none() {
                return Err(CommentsError::InvalidQuery(format!(
                    "page {} with pageSize {} is out of range",
                    page, page_size
                )));
            }
            Ok(Pagination::Page { page, page_size })
        } else {
            let start = coerce_or(&self.start, "start", 0)?;
            let limit = coerce_or(&self.limit, "limit", DEFAULT_PAGE_SIZE)?;
            Ok(Pagination::Offset { start, limit })
        }
    }
}

fn coerce_or(value: &Option<Numeric>, name: &str, default: u64) -> Result<u64> {
    value.as_ref().map(|v| v.coerce(name)).unwrap_or(Ok(default))
}

/// Resolved pagination mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    Page { page: u64, page_size: u64 },
    Offset { start: u64, limit: u64 },
}

impl Pagination {
    /// Records to skip
    pub fn offset(&self) -> u64 {
        match *self {
            Pagination::Page { page, page_size } => {
                page.saturating_sub(1).saturating_mul(page_size)
            }
            Pagination::Offset { start, .. } => start,
        }
    }

    /// Records to return
    pub fn limit(&self) -> u64 {
        match *self {
            Pagination::Page { page_size, .. } => page_size,
            Pagination::Offset { limit, .. } => limit,
        }
    }

    /// Response metadata mirroring the mode; `page_count` only in page mode
    pub fn meta(&self, total: Option<u64>) -> PaginationMeta {
        match *self {
            Pagination::Page { page, page_size } => PaginationMeta::Page {
                page,
                page_size,
                total,
                page_count: total.map(|t| page_count(t, page_size)),
            },
            Pagination::Offset { start, limit } => PaginationMeta::Offset {
                start,
                limit,
                total,
            },
        }
    }
}

/// Pages needed for `total` records; a zero page size yields zero pages
pub fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    let full = total / page_size;
    if total % page_size == 0 {
        full
    } else {
        full + 1
    }
}

/// Pagination metadata returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaginationMeta {
    Page {
        page: u64,
        #[serde(rename = "pageSize")]
        page_size: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
        #[serde(rename = "pageCount", skip_serializing_if = "Option::is_none")]
        page_count: Option<u64>,
    },
    Offset {
        start: u64,
        limit: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },
}

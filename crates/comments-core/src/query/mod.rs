//! Query compilation
//!
//! Turns user-facing sort and pagination parameters into store criteria
//! and the pagination metadata echoed back to callers.

pub mod criteria;
pub mod pagination;
pub mod sort;

pub use criteria::{Criteria, Filter};
pub use pagination::{page_count, Pagination, PaginationInput, PaginationMeta};
pub use sort::{SortDirection, SortField, SortInput};

use crate::error::Result;
use serde::Serialize;

/// Compiled sort + pagination for one listing request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub sort: Vec<SortField>,
    pub pagination: Option<Pagination>,
    pub with_count: bool,
}

impl QueryPlan {
    /// Compile user parameters
    pub fn compile(sort: Option<&SortInput>, pagination: Option<&PaginationInput>) -> Result<Self> {
        let sort = sort.map(SortInput::compile).unwrap_or_default();
        let (pagination, with_count) = match pagination {
            Some(input) => (Some(input.resolve()?), input.wants_count()),
            None => (None, false),
        };
        Ok(Self {
            sort,
            pagination,
            with_count,
        })
    }

    /// Attach ordering and paging to filter criteria
    pub fn apply_to(&self, criteria: Criteria) -> Criteria {
        let criteria = criteria.order_by(self.sort.iter().cloned());
        match self.pagination {
            Some(pagination) => criteria
                .offset(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
                .limit(usize::try_from(pagination.limit()).unwrap_or(usize::MAX)),
            None => criteria,
        }
    }

    /// Response metadata, present only when pagination was requested
    pub fn meta(&self, total: Option<u64>) -> Option<PageMeta> {
        self.pagination.map(|p| PageMeta {
            pagination: p.meta(total),
        })
    }
}

/// Listing response metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub pagination: PaginationMeta,
}

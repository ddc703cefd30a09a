//! Pagination types for grid listings
//!
//! Pages are 0-indexed: `offset = page_index * page_size`.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Pagination parameters (from the grid request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    /// Page number (0-indexed)
    #[serde(default)]
    pub page_index: u64,

    /// Items per page
    pub page_size: u64,
}

impl Pagination {
    pub fn new(page_index: u64, page_size: u64) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Reject empty pages
    pub fn validate(&self) -> Result<(), GridError> {
        if self.page_size == 0 {
            return Err(GridError::InvalidPagination {
                page_size: self.page_size,
            });
        }
        Ok(())
    }

    /// Calculate the SQL offset
    pub fn offset(&self) -> u64 {
        self.page_index.saturating_mul(self.page_size)
    }

    /// Calculate the SQL limit
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// One page of a grid listing with the total match count
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Option<Pagination>) -> Self {
        Self {
            items,
            total,
            pagination,
        }
    }

    /// Number of pages needed for `total` rows (1 when unpaginated)
    pub fn total_pages(&self) -> u64 {
        match self.pagination {
            Some(p) if p.page_size > 0 => {
                let total = self.total.max(0) as u64;
                total.div_ceil(p.page_size)
            }
            _ => 1,
        }
    }

    pub fn has_next(&self) -> bool {
        match self.pagination {
            Some(p) => p.offset().saturating_add(p.page_size) < self.total.max(0) as u64,
            None => false,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.pagination.map(|p| p.page_index > 0).unwrap_or(false)
    }
}

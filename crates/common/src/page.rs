//! Pagination types shared by every listing operation.

use serde::{Deserialize, Serialize};

/// Fixed page size for all list endpoints.
pub const PAGE_SIZE: u32 = 10;

/// A listing request: optional name-substring filter plus a 1-based page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageRequest {
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl PageRequest {
    /// Creates a request for the given page with no filter.
    pub fn page(page: u32) -> Self {
        Self {
            search: None,
            page: Some(page),
        }
    }

    /// Creates a request with a search filter on the first page.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            page: None,
        }
    }

    /// The normalized 1-based page number. Pages below 1 clamp to 1.
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// The row offset for the normalized page.
    ///
    /// Computed in `u64` so an absurdly large page number lands past the
    /// end of the data (an empty page) instead of wrapping.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number() - 1) * u64::from(PAGE_SIZE)
    }

    /// The trimmed search term, if one was supplied and is non-empty.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One page of results with enough shape to render pagination controls.
///
/// An out-of-range page is a valid, empty page, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Builds a page from the full filtered row count and this page's items.
    pub fn new(items: Vec<T>, page: u32, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(PAGE_SIZE)) as u32;
        Self {
            items,
            page,
            page_size: PAGE_SIZE,
            total_items,
            total_pages,
        }
    }
}

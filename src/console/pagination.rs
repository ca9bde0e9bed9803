//! console::pagination
//!
//! Pagination control state derived from a listing.

use std::fmt;

use crate::core::types::{page_count, Listing};

/// What a pager shows and which way it may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_count: u64,
    pub total: u64,
    pub can_previous: bool,
    pub can_next: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64, has_more: bool) -> Self {
        Self {
            page,
            page_count: page_count(total, limit),
            total,
            can_previous: page > 1,
            can_next: has_more,
        }
    }

    pub fn of<T>(listing: &Listing<T>) -> Self {
        Self::new(listing.page, listing.limit, listing.total, listing.has_more)
    }

    /// Before the first response arrives.
    pub fn empty(page: u32) -> Self {
        Self::new(page, 1, 0, false)
    }

    /// More than one page exists or could be reached.
    pub fn is_needed(&self) -> bool {
        self.page_count > 1 || self.can_previous || self.can_next
    }

    /// "Page X of Y".
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} of {}", self.page, self.page_count)
    }
}

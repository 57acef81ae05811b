//! # Repository Layer
//!
//! One repository per entity, each holding a clone of the connection pool.
//!
//! ## Conventions
//! - Conditional `UPDATE ... WHERE status = <expected>` is the concurrency
//!   guard for every transition with an invariant; zero rows affected means
//!   a concurrent writer got there first (or the row is gone), and the
//!   caller classifies which.
//! - Multi-row operations take an explicit executor so services can run them
//!   inside one `pool().begin()` transaction.
//! - JSON columns (details, tags, images, payload) are serialized with
//!   serde_json on the way in and parsed on the way out.

pub mod account;
pub mod donation;
pub mod favorite;
pub mod item;
pub mod notification;
pub mod stats;
pub mod transaction;

use uuid::Uuid;

// =============================================================================
// Pagination
// =============================================================================

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Default page size when none is given.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// A pagination request (1-based page number).
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Creates a page request, clamping out-of-range values.
    pub fn new(page: u32, limit: u32) -> Self {
        Page {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// SQL LIMIT value.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit as i64
    }

    /// SQL OFFSET value.
    #[inline]
    pub fn offset(&self) -> i64 {
        ((self.page - 1) as i64) * (self.limit as i64)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// A page of rows together with the total match count.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub rows: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn new(rows: Vec<T>, total: i64, page: Page) -> Self {
        Paginated {
            rows,
            total,
            page: page.page,
            limit: page.limit,
        }
    }

    /// Number of pages for this total at this limit.
    pub fn pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.limit as i64 - 1) / self.limit as i64
        }
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

/// Resolves a requested sort field against a whitelist of real columns.
///
/// Unknown fields fall back to `created_at` rather than erroring; sort is a
/// preference, not a contract.
pub(crate) fn sort_column<'a>(requested: Option<&str>, allowed: &[&'a str]) -> &'a str {
    match requested {
        Some(field) => allowed
            .iter()
            .find(|col| **col == field)
            .copied()
            .unwrap_or("created_at"),
        None => "created_at",
    }
}

// =============================================================================
// ID Generation
// =============================================================================

/// Generates a new entity id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamping() {
        let p = Page::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);

        let p = Page::new(3, 500);
        assert_eq!(p.limit, MAX_PAGE_LIMIT);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn test_paginated_pages() {
        let p = Paginated::new(vec![1, 2, 3], 25, Page::new(1, 10));
        assert_eq!(p.pages(), 3);

        let empty: Paginated<i32> = Paginated::new(vec![], 0, Page::default());
        assert_eq!(empty.pages(), 0);
    }

    #[test]
    fn test_sort_column_whitelist() {
        let allowed = ["created_at", "views", "quantity"];
        assert_eq!(sort_column(Some("views"), &allowed), "views");
        assert_eq!(sort_column(Some("password_hash"), &allowed), "created_at");
        assert_eq!(sort_column(None, &allowed), "created_at");
    }
}

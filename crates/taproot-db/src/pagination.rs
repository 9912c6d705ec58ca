//! Pagination arithmetic.
//!
//! A [`Pagination`] is a 1-based page window that the query builder turns
//! into `limit` + `offset` via [`Query::paginate`](crate::query::builder::Query::paginate).

use taproot_core::{OrmError, OrmResult};

/// A 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    per_page: u64,
}

impl Pagination {
    /// Creates a window for the given page. A page below 1 is clamped to 1.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] if `per_page` is zero.
    pub fn new(page: u64, per_page: u64) -> OrmResult<Self> {
        if per_page == 0 {
            return Err(OrmError::ConfigurationError(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            page: page.max(1),
            per_page,
        })
    }

    /// Returns the 1-based page number.
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Returns the number of rows per page.
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Returns the number of rows to skip.
    pub const fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    /// Returns how many pages a result set of `total` rows spans.
    pub const fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_arithmetic() {
        let pager = Pagination::new(1, 25).unwrap();
        assert_eq!(pager.offset(), 0);
        let pager = Pagination::new(4, 25).unwrap();
        assert_eq!(pager.offset(), 75);
    }

    #[test]
    fn test_page_clamps_to_one() {
        let pager = Pagination::new(0, 10).unwrap();
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.offset(), 0);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            Pagination::new(1, 0),
            Err(OrmError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_page_count() {
        let pager = Pagination::new(1, 10).unwrap();
        assert_eq!(pager.page_count(0), 0);
        assert_eq!(pager.page_count(10), 1);
        assert_eq!(pager.page_count(11), 2);
    }
}

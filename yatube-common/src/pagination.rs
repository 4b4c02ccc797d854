//! Page-number pagination over counted listings.
//!
//! Out-of-range requests never fail: anything that is not an integer selects
//! the first page, and numbers outside `1..=num_pages` select the last one.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;

pub const POSTS_PER_PAGE: NonZeroU64 = NonZeroU64::new(10).unwrap();

/// A page number as requested by the client, before it is clamped.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    number: i64,
    per_page: NonZeroU64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: 1,
            per_page: POSTS_PER_PAGE,
        }
    }
}

impl PageRequest {
    #[must_use]
    pub fn new(number: i64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Parses the raw `page` query value.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|raw| raw.trim().parse().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Resolves the request against the total number of records.
    #[must_use]
    pub fn locate(self, count: u64) -> PageWindow {
        let per_page = self.per_page.get();
        let num_pages = count.div_ceil(per_page).max(1);
        let number = u64::try_from(self.number)
            .ok()
            .filter(|number| (1..=num_pages).contains(number))
            .unwrap_or(num_pages);

        PageWindow {
            number,
            num_pages,
            count,
            per_page,
        }
    }
}

/// The slice of a listing that one page covers.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    number: u64,
    num_pages: u64,
    count: u64,
    per_page: u64,
}

impl PageWindow {
    #[must_use]
    pub fn number(self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn num_pages(self) -> u64 {
        self.num_pages
    }

    /// Total number of records across all pages.
    #[must_use]
    pub fn count(self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn offset(self) -> u64 {
        (self.number - 1) * self.per_page
    }

    #[must_use]
    pub fn limit(self) -> u64 {
        self.per_page
    }

    #[must_use]
    pub fn has_next(self) -> bool {
        self.number < self.num_pages
    }

    #[must_use]
    pub fn has_previous(self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub fn next_page_number(self) -> Option<u64> {
        self.has_next().then_some(self.number + 1)
    }

    #[must_use]
    pub fn previous_page_number(self) -> Option<u64> {
        self.has_previous().then_some(self.number - 1)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Page<T> {
    pub window: PageWindow,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(window: PageWindow, items: Vec<T>) -> Self {
        Self { window, items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::pagination::PageRequest;

    #[test]
    fn eleven_records_make_two_pages() {
        let first = PageRequest::from_query(None).locate(11);
        assert_eq!(first.number(), 1);
        assert_eq!(first.num_pages(), 2);
        assert_eq!((first.offset(), first.limit()), (0, 10));
        assert!(first.has_next());
        assert!(!first.has_previous());
        assert_eq!(first.next_page_number(), Some(2));

        let second = PageRequest::from_query(Some("2")).locate(11);
        assert_eq!(second.offset(), 10);
        assert_eq!(second.count() - second.offset(), 1);
        assert!(!second.has_next());
        assert_eq!(second.previous_page_number(), Some(1));
    }

    #[test]
    fn garbage_selects_first_page() {
        for raw in ["", "abc", "2.5", "1e3"] {
            assert_eq!(
                PageRequest::from_query(Some(raw)).locate(100).number(),
                1,
                "{raw}"
            );
        }
    }

    #[test]
    fn out_of_range_selects_last_page() {
        assert_eq!(PageRequest::from_query(Some("99")).locate(25).number(), 3);
        assert_eq!(PageRequest::from_query(Some("0")).locate(25).number(), 3);
        assert_eq!(PageRequest::from_query(Some("-4")).locate(25).number(), 3);
    }

    #[test]
    fn empty_listing_has_one_empty_page() {
        let window = PageRequest::default().locate(0);
        assert_eq!(window.number(), 1);
        assert_eq!(window.num_pages(), 1);
        assert_eq!(window.offset(), 0);
        assert!(!window.has_next());
        assert!(!window.has_previous());
    }
}

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Page size used when a list screen first opens.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination envelope driving every list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    current_page: u32,
    page_size: u32,
    total_records: u64,
    total_pages: u32,
    has_next: bool,
    has_previous: bool,
}

impl Pagination {
    /// Derives the envelope from the current page, page size and record count.
    ///
    /// A zero page size or page number is treated as one.
    #[must_use]
    pub fn from_totals(current_page: u32, page_size: u32, total_records: u64) -> Self {
        let current_page = current_page.max(1);
        let page_size = page_size.max(1);
        let total_pages =
            u32::try_from(total_records.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX);

        Self {
            current_page,
            page_size,
            total_records,
            total_pages,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }

    /// Envelope for an empty first page.
    #[must_use]
    pub fn empty(page_size: u32) -> Self {
        Self::from_totals(1, page_size, 0)
    }

    /// Returns the one-based current page.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Returns the page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the total number of records across all pages.
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Returns `ceil(total_records / page_size)`.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Returns whether a following page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Returns whether a preceding page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Returns the one-based `(first, last)` record numbers on this page.
    ///
    /// Both are zero when there are no records.
    #[must_use]
    pub fn display_range(&self) -> (u64, u64) {
        if self.total_records == 0 {
            return (0, 0);
        }

        let page_size = u64::from(self.page_size);
        let first = u64::from(self.current_page - 1)
            .saturating_mul(page_size)
            .saturating_add(1);
        let last = u64::from(self.current_page)
            .saturating_mul(page_size)
            .min(self.total_records);

        (first.min(last), last)
    }

    /// Returns the "showing X to Y of Z" caption.
    #[must_use]
    pub fn summary(&self) -> String {
        let (first, last) = self.display_range();
        format!(
            "Showing {first} to {last} of {} entries",
            self.total_records
        )
    }

    /// Returns every page button to render; there is no windowing.
    #[must_use]
    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.total_pages
    }
}

/// Returns whether a page size is one of the selector options.
#[must_use]
pub fn is_offered_page_size(page_size: u32) -> bool {
    PAGE_SIZE_OPTIONS.contains(&page_size)
}

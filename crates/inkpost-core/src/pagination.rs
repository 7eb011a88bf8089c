// ABOUTME: Pagination engine mapping a page number and page size onto a listing window.
// ABOUTME: Out-of-range input is normalised silently; nothing here returns an error.

/// Posts shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A 1-indexed window over the post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub offset: usize,
    pub limit: usize,
    pub total_pages: u32,
}

impl PageWindow {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// True while the current page is before the last page. Pages past the
    /// end have no next page either.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn previous_page(&self) -> Option<u32> {
        self.has_previous().then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next().then(|| self.page + 1)
    }
}

/// Compute the window for `page` given `total_count` items.
///
/// A page below 1 is treated as 1 and a page size below 1 as 1. The total
/// page count is never less than 1, so an empty listing reports page 1 of 1.
/// Pages past the end are not clamped; the store returns an empty slice for
/// them.
pub fn paginate(total_count: usize, page: u32, page_size: usize) -> PageWindow {
    let page = page.max(1);
    let page_size = page_size.max(1);

    let offset = (page as usize - 1).saturating_mul(page_size);
    let total_pages = total_count.div_ceil(page_size).max(1);

    PageWindow {
        page,
        offset,
        limit: page_size,
        total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
    }
}

/// Parse a raw `page` query value. Missing, non-numeric, zero and negative
/// values all become page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .map(|page| u32::try_from(page).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

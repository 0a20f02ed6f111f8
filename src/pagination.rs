//! Page-number pagination over newest-first listings.
//!
//! Out-of-range page numbers never fail: anything below 1 lands on the first
//! page, anything past the end lands on the last page. An empty listing still
//! has one (empty) page.

use serde::Serialize;

pub const POSTS_PER_PAGE: usize = 10;

/// Parse the `page` query parameter. Missing or non-numeric input means page 1.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(1)
}

/// The clamped position of one page inside a listing of `total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: usize,
    pub size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl PageWindow {
    pub fn resolve(requested: i64, total_items: usize, size: usize) -> Self {
        let size = size.max(1);
        let total_pages = total_items.div_ceil(size).max(1);
        let number = if requested < 1 {
            1
        } else {
            usize::try_from(requested)
                .unwrap_or(usize::MAX)
                .min(total_pages)
        };

        Self {
            number,
            size,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.size
    }

    /// Number of items on this page (the last page may be short).
    pub fn limit(&self) -> usize {
        self.total_items
            .saturating_sub(self.offset())
            .min(self.size)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Wrap items already sliced by storage according to `window`.
    pub fn from_window(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next.then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous.then(|| self.number - 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

/// Slice an already ordered sequence.
pub fn paginate<T>(items: Vec<T>, requested: i64, size: usize) -> Page<T> {
    let window = PageWindow::resolve(requested, items.len(), size);
    let slice = items
        .into_iter()
        .skip(window.offset())
        .take(window.limit())
        .collect();
    Page::from_window(slice, window)
}

use serde::{Deserialize, Serialize};

/// Slices an ordered sequence into fixed-size pages. Page numbers are
/// 1-based; any invalid request degrades to a valid page instead of
/// erroring.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
}

/// One page of results plus the metadata navigation controls need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based number of this page
    pub number: usize,
    /// Total number of pages, at least 1
    pub num_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

impl<T: Clone> Paginator<T> {
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        Self {
            items,
            // per_page must be at least 1
            per_page: per_page.max(1),
        }
    }

    /// Total number of pages. An empty sequence still has one page.
    pub fn num_pages(&self) -> usize {
        self.items.len().div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw page request: absent, non-numeric, zero or
    /// negative values become page 1, anything past the end becomes
    /// the last page.
    pub fn get_page(&self, requested: Option<&str>) -> Page<T> {
        let num_pages = self.num_pages();
        let number = requested
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(1)
            .min(num_pages);

        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.items.len());
        let items = self.items.get(start..end).unwrap_or(&[]).to_vec();

        Page {
            items,
            number,
            num_pages,
        }
    }
}

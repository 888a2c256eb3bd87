//! Page arithmetic shared by list endpoints
//!
//! Pages are 1-based. Out-of-range inputs are clamped rather than rejected so
//! a sloppy query string still yields a usable page.

/// Default number of items per page
pub const DEFAULT_LIMIT: u32 = 10;

/// Upper bound on the number of items per page
pub const MAX_LIMIT: u32 = 100;

/// A normalised page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u32,
    /// Number of items per page, within `1..=MAX_LIMIT`
    pub limit: u32,
}

impl PageRequest {
    /// Build a page request from optional query values; negative and zero
    /// values clamp to the lower bound
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let limit = limit
            .unwrap_or(i64::from(DEFAULT_LIMIT))
            .clamp(1, i64::from(MAX_LIMIT));

        Self {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            limit: u32::try_from(limit).unwrap_or(MAX_LIMIT),
        }
    }

    /// Number of items to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Number of pages needed for `total` items
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }

    /// Slice the page out of an already filtered and ordered list
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(offset)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}
